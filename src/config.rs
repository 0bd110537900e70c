//! Configuration Module
//!
//! Handles loading the cache sizing parameters from a properties file or
//! environment variables, falling back to compiled-in defaults.

use std::env;
use std::path::Path;
use std::time::Duration;

use ini::Ini;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{CacheError, Result};

/// Default ceiling: 100 MiB
pub const DEFAULT_MAX_CACHE_SIZE: i64 = 104_857_600;
/// Default floor: 50 MiB
pub const DEFAULT_MIN_CACHE_SIZE: i64 = 52_428_800;
/// Default largest cacheable payload: 50 MiB
pub const DEFAULT_LARGEST_CACHEABLE_SIZE: i64 = 52_428_800;
/// Default max age: one hour in milliseconds
pub const DEFAULT_MAX_AGE_MS: i64 = 3_600_000;

const KEY_MAX_CACHE_SIZE: &str = "MAX_CACHE_SIZE";
const KEY_MIN_CACHE_SIZE: &str = "MIN_CACHE_SIZE";
const KEY_LARGEST_CACHEABLE_SIZE: &str = "LARGEST_CACHEABLE_SIZE";
const KEY_MAX_AGE: &str = "MAX_AGE";
const KEYS: [&str; 4] = [
    KEY_MAX_CACHE_SIZE,
    KEY_MIN_CACHE_SIZE,
    KEY_LARGEST_CACHEABLE_SIZE,
    KEY_MAX_AGE,
];

/// Cache sizing parameters.
///
/// A value of this type is also the immutable snapshot the cache reads on
/// every operation; runtime setters install a modified copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    /// Ceiling in bytes. A value <= 0 disables the cache.
    pub max_cache_size: i64,
    /// Floor in bytes that an eviction pass drains down to
    pub min_cache_size: i64,
    /// Payloads of this size or larger are never cached
    pub largest_cacheable_size: i64,
    /// Max entry age in milliseconds
    pub max_age_ms: i64,
}

impl CacheConfig {
    // == Trigger ==
    /// Size at which the eviction worker is woken: midway between floor and ceiling.
    pub fn trigger_clean_size(&self) -> i64 {
        self.min_cache_size + (self.max_cache_size - self.min_cache_size) / 2
    }

    /// Max age as a Duration. Negative ages clamp to zero.
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms.max(0) as u64)
    }

    /// Checks that the floor does not exceed the ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.max_cache_size > 0 && self.min_cache_size > self.max_cache_size {
            return Err(CacheError::InvalidSizing(format!(
                "min cache size {} exceeds max cache size {}",
                self.min_cache_size, self.max_cache_size
            )));
        }
        if self.min_cache_size < 0 || self.largest_cacheable_size < 0 || self.max_age_ms < 0 {
            return Err(CacheError::InvalidSizing(
                "sizes and max age must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    // == Properties Source ==
    /// Parses `KEY=value` properties text.
    ///
    /// Keys are read from the section-less part of the file. Unknown keys are
    /// ignored, missing keys keep their defaults, and a value that is not an
    /// integer is an error.
    pub fn from_properties_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        Self::from_ini(&ini)
    }

    /// Reads and parses a properties file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = Self::default();
        let section = ini.general_section();

        for key in KEYS {
            if let Some(value) = section.get(key) {
                if let Some(field) = config.field_mut(key) {
                    *field = parse_value(key, value.trim())?;
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads a properties file, logging and falling back to defaults when the
    /// file is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                info!(
                    "Loaded cache configuration from {}: max={} min={} largest={} max_age={}ms",
                    path.display(),
                    config.max_cache_size,
                    config.min_cache_size,
                    config.largest_cacheable_size,
                    config.max_age_ms
                );
                config
            }
            Err(e) => {
                error!("cannot load {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    // == Environment Source ==
    /// Creates a config from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_SIZE` - Ceiling in bytes (default: 104857600)
    /// - `MIN_CACHE_SIZE` - Floor in bytes (default: 52428800)
    /// - `LARGEST_CACHEABLE_SIZE` - Largest cacheable payload (default: 52428800)
    /// - `MAX_AGE` - Max entry age in milliseconds (default: 3600000)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overrides fields with any parseable environment variable of the same name.
    pub fn with_env_overrides(mut self) -> Self {
        for key in KEYS {
            let Ok(raw) = env::var(key) else {
                continue;
            };
            match parse_value(key, raw.trim()) {
                Ok(value) => {
                    if let Some(field) = self.field_mut(key) {
                        *field = value;
                    }
                }
                Err(e) => warn!("ignoring environment override: {}", e),
            }
        }
        self
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut i64> {
        match key {
            KEY_MAX_CACHE_SIZE => Some(&mut self.max_cache_size),
            KEY_MIN_CACHE_SIZE => Some(&mut self.min_cache_size),
            KEY_LARGEST_CACHEABLE_SIZE => Some(&mut self.largest_cacheable_size),
            KEY_MAX_AGE => Some(&mut self.max_age_ms),
            _ => None,
        }
    }
}

fn parse_value(key: &str, value: &str) -> Result<i64> {
    value.parse().map_err(|_| CacheError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            min_cache_size: DEFAULT_MIN_CACHE_SIZE,
            largest_cacheable_size: DEFAULT_LARGEST_CACHEABLE_SIZE,
            max_age_ms: DEFAULT_MAX_AGE_MS,
        }
    }
}
