//! Tile Payload Module
//!
//! The rendered points and colours for one tile, plus the sizing trait the
//! cache uses to account for any payload it holds.

use std::mem::size_of;

// == Weigh ==
/// Best-effort size in bytes of a cached payload.
pub trait Weigh {
    fn weight(&self) -> i64;
}

impl Weigh for Vec<u8> {
    fn weight(&self) -> i64 {
        self.len() as i64
    }
}

impl Weigh for String {
    fn weight(&self) -> i64 {
        self.len() as i64
    }
}

// == Tile Payload ==
/// Points and colours rendered for a map tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePayload {
    /// Flattened longitude/latitude pairs
    pub points: Vec<f32>,
    /// One ARGB colour per point
    pub colours: Vec<i32>,
    /// Optional occurrence count per point
    pub counts: Option<Vec<i32>>,
}

/// Fixed overhead charged to every payload.
const PAYLOAD_OVERHEAD: i64 = size_of::<TilePayload>() as i64;

impl TilePayload {
    pub fn new(points: Vec<f32>, colours: Vec<i32>, counts: Option<Vec<i32>>) -> Self {
        Self {
            points,
            colours,
            counts,
        }
    }

    /// Number of points in the tile.
    pub fn point_count(&self) -> usize {
        self.points.len() / 2
    }

    /// Estimated size of a payload holding `occurrence_count` points,
    /// usable before the payload is rendered.
    pub fn estimate_size(occurrence_count: usize, has_counts: bool) -> i64 {
        let per_point = 2 * size_of::<f32>() + size_of::<i32>();
        let counts = if has_counts { size_of::<i32>() } else { 0 };
        PAYLOAD_OVERHEAD + (occurrence_count * (per_point + counts)) as i64
    }
}

impl Weigh for TilePayload {
    fn weight(&self) -> i64 {
        let counts = self.counts.as_ref().map_or(0, |c| c.len() * size_of::<i32>());
        PAYLOAD_OVERHEAD
            + (self.points.len() * size_of::<f32>()
                + self.colours.len() * size_of::<i32>()
                + counts) as i64
    }
}
