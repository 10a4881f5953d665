//! Core library for SafeWeather.
//!
//! This crate defines:
//! - Configuration handling
//! - Abstraction over weather providers, with a WeatherAPI.com client
//! - Normalized domain models (snapshots, forecasts, alerts, air quality)
//! - A TTL-cached service that falls back to demo data instead of failing
//!
//! It is used by `safeweather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod demo;
pub mod indices;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod retry;
pub mod service;

pub use config::Config;
pub use model::{
    AirQualityReading, AlertRecord, AlertSeverity, AqiTier, Coordinates, FallbackReason, Fetched,
    ForecastBundle, WeatherReport, WeatherSnapshot, WindDirection,
};
pub use provider::{ProviderError, WeatherProvider, weatherapi::WeatherApiProvider};
pub use service::WeatherService;
