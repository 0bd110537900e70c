//! Cache Key Module
//!
//! Builds cache keys from a query signature, colour mode and point resolution.

use std::fmt;

const SEPARATOR: char = '|';
const ESCAPE: char = '\\';

// == Point Resolution ==
/// Spatial resolution a tile's points are aggregated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointResolution {
    /// Raw occurrence coordinates
    Raw,
    /// 1 degree grid
    Grid1,
    /// 0.1 degree grid
    Grid01,
    /// 0.01 degree grid
    Grid001,
    /// 0.001 degree grid
    Grid0001,
    /// 0.0001 degree grid
    Grid00001,
}

impl PointResolution {
    /// All resolutions from coarsest grid to raw.
    pub const ALL: [PointResolution; 6] = [
        PointResolution::Grid1,
        PointResolution::Grid01,
        PointResolution::Grid001,
        PointResolution::Grid0001,
        PointResolution::Grid00001,
        PointResolution::Raw,
    ];

    /// Stable label used in cache keys.
    pub fn label(&self) -> &'static str {
        match self {
            PointResolution::Raw => "point",
            PointResolution::Grid1 => "point-1",
            PointResolution::Grid01 => "point-0.1",
            PointResolution::Grid001 => "point-0.01",
            PointResolution::Grid0001 => "point-0.001",
            PointResolution::Grid00001 => "point-0.0001",
        }
    }

    /// Grid cell size in degrees, or None for raw points.
    pub fn grid_size(&self) -> Option<f64> {
        match self {
            PointResolution::Raw => None,
            PointResolution::Grid1 => Some(1.0),
            PointResolution::Grid01 => Some(0.1),
            PointResolution::Grid001 => Some(0.01),
            PointResolution::Grid0001 => Some(0.001),
            PointResolution::Grid00001 => Some(0.0001),
        }
    }
}

impl fmt::Display for PointResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl AsRef<str> for PointResolution {
    fn as_ref(&self) -> &str {
        self.label()
    }
}

// == Cache Key ==
/// Opaque key identifying one rendered tile payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Joins the three parts with `|`, escaping `|` and `\` inside each part
    /// so that different triples never produce the same key.
    pub fn new(query: &str, colour_mode: &str, resolution: &str) -> Self {
        let mut key = String::with_capacity(query.len() + colour_mode.len() + resolution.len() + 2);
        push_escaped(&mut key, query);
        key.push(SEPARATOR);
        push_escaped(&mut key, colour_mode);
        key.push(SEPARATOR);
        push_escaped(&mut key, resolution);
        Self(key)
    }
}

fn push_escaped(out: &mut String, part: &str) {
    for c in part.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
