use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Provider query form, `"{lat},{lon}"`.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Eight-point compass bucket for wind direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl WindDirection {
    pub const ALL: [WindDirection; 8] = [
        WindDirection::N,
        WindDirection::NE,
        WindDirection::E,
        WindDirection::SE,
        WindDirection::S,
        WindDirection::SW,
        WindDirection::W,
        WindDirection::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WindDirection::N => "N",
            WindDirection::NE => "NE",
            WindDirection::E => "E",
            WindDirection::SE => "SE",
            WindDirection::S => "S",
            WindDirection::SW => "SW",
            WindDirection::W => "W",
            WindDirection::NW => "NW",
        }
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather condition as reported by the provider, plus the display icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_mb: f64,
    pub wind_speed_mps: f64,
    pub wind_direction: WindDirection,
    pub visibility_km: f64,
    pub cloud_pct: u8,
    pub condition: Condition,
    /// Local time at the location.
    pub sunrise: NaiveDateTime,
    /// Local time at the location.
    pub sunset: NaiveDateTime,
    pub location_name: String,
    pub coordinates: Coordinates,
    pub observation_time: DateTime<Utc>,
    pub air_quality: Option<AirQualityReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub avg_temp_c: f64,
    pub condition: String,
    pub icon: String,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub precipitation_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: String,
    pub icon: String,
    pub precipitation_mm: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub location_name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub daily: Vec<DailyForecast>,
    pub hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub event: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sender: String,
    pub severity: AlertSeverity,
    pub tags: Vec<String>,
}

impl AlertRecord {
    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }
}

/// Ordinal air-quality tier, 1 (Good) through 5 (Very Poor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AqiTier {
    Good = 1,
    Fair = 2,
    Moderate = 3,
    Poor = 4,
    VeryPoor = 5,
}

impl AqiTier {
    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiTier::Good => "Good",
            AqiTier::Fair => "Fair",
            AqiTier::Moderate => "Moderate",
            AqiTier::Poor => "Poor",
            AqiTier::VeryPoor => "Very Poor",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AqiTier::Good => "#10b981",
            AqiTier::Fair => "#f59e0b",
            AqiTier::Moderate => "#f97316",
            AqiTier::Poor => "#ef4444",
            AqiTier::VeryPoor => "#7c3aed",
        }
    }
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    pub pm2_5: f64,
    pub pm10: f64,
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub tier: AqiTier,
    pub pollutants: Pollutants,
}

/// Why a fallback payload was served instead of live data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    NotConfigured,
    Transport(String),
    Status(u16),
    Malformed(String),
    MissingAirQuality,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NotConfigured => f.write_str("weather API key is not configured"),
            FallbackReason::Transport(msg) => write!(f, "network error: {msg}"),
            FallbackReason::Status(code) => write!(f, "provider returned HTTP {code}"),
            FallbackReason::Malformed(msg) => write!(f, "unexpected provider response: {msg}"),
            FallbackReason::MissingAirQuality => f.write_str("provider sent no air-quality data"),
        }
    }
}

/// Either live provider data or a demo payload tagged with the failure that
/// caused it. Callers must match on it to learn which one they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Fetched<T> {
    Live { data: T },
    Fallback { data: T, reason: FallbackReason },
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Fetched::Live { data }
    }

    pub fn fallback(data: T, reason: FallbackReason) -> Self {
        Fetched::Fallback { data, reason }
    }

    pub fn data(&self) -> &T {
        match self {
            Fetched::Live { data } | Fetched::Fallback { data, .. } => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Fetched::Live { data } | Fetched::Fallback { data, .. } => data,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Fetched::Live { .. })
    }

    pub fn is_fallback(&self) -> bool {
        !self.is_live()
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            Fetched::Live { .. } => None,
            Fetched::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Everything the aggregate refresh gathers for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: Fetched<WeatherSnapshot>,
    pub forecast: Fetched<ForecastBundle>,
    pub alerts: Fetched<Vec<AlertRecord>>,
    pub air_quality: Fetched<AirQualityReading>,
}

impl WeatherReport {
    pub fn critical_alerts(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.data().iter().filter(|a| a.is_critical())
    }
}
