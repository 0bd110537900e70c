//! Error types for the tile cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the tile cache.
///
/// Admission failures are not errors: `put` reports them with a boolean so
/// callers can fall back to an uncached render.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration file could not be read or is not valid ini text
    #[error("Cannot read configuration: {0}")]
    Ini(#[from] ini::Error),

    /// A configuration value could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },

    /// Sizing parameters are inconsistent
    #[error("Invalid sizing: {0}")]
    InvalidSizing(String),
}

// == Result Type Alias ==
/// Convenience Result type for the tile cache.
pub type Result<T> = std::result::Result<T, CacheError>;
