//! In-memory TTL cache for normalized provider payloads.
//!
//! Entries older than the TTL are never returned. The cache is bounded; moka
//! evicts by recency and frequency once `capacity` is reached.

use std::time::Duration;

use moka::sync::Cache;

use crate::model::{Coordinates, ForecastBundle, WeatherSnapshot};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: u64 = 256;

/// Which operation a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Current,
    Forecast,
}

/// Cache key with coordinates fixed to four decimal places (about 11 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: DataKind,
    lat_e4: i64,
    lon_e4: i64,
}

impl CacheKey {
    pub fn new(kind: DataKind, coords: Coordinates) -> Self {
        Self {
            kind,
            lat_e4: (coords.lat * 1e4).round() as i64,
            lon_e4: (coords.lon * 1e4).round() as i64,
        }
    }
}

/// Normalized payload stored per key.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Current(WeatherSnapshot),
    Forecast(ForecastBundle),
}

pub type WeatherCache = Cache<CacheKey, CachedPayload>;

pub fn build_cache(ttl: Duration, capacity: u64) -> WeatherCache {
    Cache::builder()
        .max_capacity(capacity.max(1))
        .time_to_live(ttl)
        .build()
}
