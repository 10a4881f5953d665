use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    Config,
    config::{DEFAULT_BASE_URL, PLACEHOLDER_API_KEY},
    model::{
        AirQualityReading, AlertRecord, Condition, Coordinates, DailyForecast, ForecastBundle,
        HourlyForecast, Pollutants, WeatherSnapshot,
    },
    normalize::{self, whole_degrees},
    retry::{RetryPolicy, with_retry},
};

use super::{ProviderError, ProviderResult, WeatherProvider};

const FORECAST_ENDPOINT: &str = "forecast.json";
const ALERTS_ENDPOINT: &str = "alerts.json";
const FORECAST_DAYS: &str = "7";
const HOURLY_WINDOW: usize = 24;

/// Client for WeatherAPI.com.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.provider.timeout())
            .build()
            .context("Failed to build HTTP client for WeatherAPI.com")?;

        let base_url = if config.provider.base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.provider.base_url.clone()
        };

        Ok(Self {
            api_key: config.provider.api_key.clone(),
            base_url,
            retry: config.retry.policy(),
            http,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&'static str, String)],
    ) -> ProviderResult<T> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured);
        }

        let url = self.url(endpoint);
        let mut query: Vec<(&str, &str)> = vec![("key", self.api_key.as_str())];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        tracing::debug!(%url, "requesting WeatherAPI.com");

        let res = with_retry(&self.retry, || self.http.get(&url).query(&query).send())
            .await
            .map_err(|source| ProviderError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }

    async fn fetch_current(&self, coords: Coordinates) -> ProviderResult<WeatherSnapshot> {
        // forecast.json carries the current block plus astro and air quality
        let parsed: WaForecastResponse = self
            .get_json(
                FORECAST_ENDPOINT,
                &[
                    ("q", coords.to_query()),
                    ("days", "1".to_string()),
                    ("aqi", "yes".to_string()),
                ],
            )
            .await?;

        normalize_current(parsed)
    }

    async fn fetch_forecast(&self, coords: Coordinates) -> ProviderResult<ForecastBundle> {
        let parsed: WaForecastResponse = self
            .get_json(
                FORECAST_ENDPOINT,
                &[("q", coords.to_query()), ("days", FORECAST_DAYS.to_string())],
            )
            .await?;

        normalize_forecast(parsed)
    }

    async fn fetch_alerts(&self, coords: Coordinates) -> ProviderResult<Vec<AlertRecord>> {
        let parsed: WaAlertsResponse = self
            .get_json(ALERTS_ENDPOINT, &[("q", coords.to_query())])
            .await?;

        Ok(normalize_alerts(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
    /// e.g. "2025-03-01 9:05", local to the location
    #[serde(default)]
    localtime: Option<String>,
    #[serde(default)]
    localtime_epoch: Option<i64>,
}

impl WaLocation {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    fn local_date(&self) -> NaiveDate {
        self.localtime
            .as_deref()
            .and_then(|lt| lt.split_whitespace().next())
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    code: u32,
}

impl WaCondition {
    fn icon(&self) -> String {
        normalize::condition_icon(self.code).to_string()
    }
}

#[derive(Debug, Deserialize)]
struct WaAirQuality {
    #[serde(default)]
    co: f64,
    #[serde(default)]
    no2: f64,
    #[serde(default)]
    o3: f64,
    #[serde(default)]
    so2: f64,
    pm2_5: f64,
    #[serde(default)]
    pm10: f64,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    #[serde(default)]
    last_updated_epoch: Option<i64>,
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    pressure_mb: f64,
    wind_kph: f64,
    wind_degree: f64,
    vis_km: f64,
    cloud: u8,
    condition: WaCondition,
    #[serde(default)]
    air_quality: Option<WaAirQuality>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avgtemp_c: f64,
    maxwind_kph: f64,
    totalprecip_mm: f64,
    avghumidity: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    #[serde(default)]
    sunrise: Option<String>,
    #[serde(default)]
    sunset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    time_epoch: i64,
    temp_c: f64,
    condition: WaCondition,
    #[serde(default)]
    precip_mm: f64,
    humidity: u8,
    wind_kph: f64,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    #[serde(default)]
    astro: Option<WaAstro>,
    #[serde(default)]
    hour: Vec<WaHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    #[serde(default)]
    current: Option<WaCurrent>,
    #[serde(default)]
    forecast: Option<WaForecast>,
}

#[derive(Debug, Deserialize)]
struct WaAlert {
    event: String,
    #[serde(default, alias = "desc")]
    description: String,
    #[serde(default)]
    start: Option<i64>,
    #[serde(default)]
    end: Option<i64>,
    #[serde(default)]
    effective: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    expires: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    sender_name: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Alerts arrive either as a bare list or wrapped as `{"alert": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WaAlertList {
    Flat(Vec<WaAlert>),
    Nested {
        #[serde(default)]
        alert: Vec<WaAlert>,
    },
}

#[derive(Debug, Deserialize)]
struct WaAlertsResponse {
    #[serde(default)]
    alerts: Option<WaAlertList>,
}

fn missing_block(block: &str) -> ProviderError {
    ProviderError::Malformed {
        endpoint: FORECAST_ENDPOINT,
        message: format!("response has no `{block}` block"),
    }
}

fn normalize_current(parsed: WaForecastResponse) -> ProviderResult<WeatherSnapshot> {
    let current = parsed.current.ok_or_else(|| missing_block("current"))?;
    let location = parsed.location;
    let local_date = location.local_date();
    let astro = parsed
        .forecast
        .as_ref()
        .and_then(|f| f.forecastday.first())
        .and_then(|d| d.astro.as_ref());

    let sunrise = astro
        .and_then(|a| a.sunrise.as_deref())
        .and_then(|s| normalize::astro_time(local_date, s))
        .unwrap_or_else(|| normalize::placeholder_sunrise(local_date));
    let sunset = astro
        .and_then(|a| a.sunset.as_deref())
        .and_then(|s| normalize::astro_time(local_date, s))
        .unwrap_or_else(|| normalize::placeholder_sunset(local_date));

    let observation_time = current
        .last_updated_epoch
        .or(location.localtime_epoch)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    let air_quality = current.air_quality.as_ref().map(|aq| AirQualityReading {
        tier: normalize::aqi_from_pm25(aq.pm2_5),
        pollutants: Pollutants {
            pm2_5: aq.pm2_5,
            pm10: aq.pm10,
            co: aq.co,
            no2: aq.no2,
            o3: aq.o3,
            so2: aq.so2,
        },
    });

    Ok(WeatherSnapshot {
        temperature_c: whole_degrees(current.temp_c),
        feels_like_c: whole_degrees(current.feelslike_c),
        humidity_pct: current.humidity,
        pressure_mb: current.pressure_mb,
        wind_speed_mps: normalize::kph_to_mps(current.wind_kph),
        wind_direction: normalize::wind_direction(current.wind_degree),
        visibility_km: current.vis_km,
        cloud_pct: current.cloud,
        condition: Condition {
            icon: current.condition.icon(),
            text: current.condition.text,
            code: current.condition.code,
        },
        sunrise,
        sunset,
        coordinates: location.coordinates(),
        location_name: location.name,
        observation_time,
        air_quality,
    })
}

fn normalize_forecast(parsed: WaForecastResponse) -> ProviderResult<ForecastBundle> {
    let forecast = parsed.forecast.ok_or_else(|| missing_block("forecast"))?;
    let location = parsed.location;
    let now_epoch = location.localtime_epoch.unwrap_or_else(|| Utc::now().timestamp());

    let daily = forecast
        .forecastday
        .iter()
        .map(|fd| DailyForecast {
            date: fd.date,
            min_temp_c: whole_degrees(fd.day.mintemp_c),
            max_temp_c: whole_degrees(fd.day.maxtemp_c),
            avg_temp_c: whole_degrees(fd.day.avgtemp_c),
            condition: fd.day.condition.text.clone(),
            icon: fd.day.condition.icon(),
            humidity_pct: fd.day.avghumidity,
            wind_speed_mps: normalize::kph_to_mps(fd.day.maxwind_kph),
            precipitation_mm: fd.day.totalprecip_mm,
        })
        .collect();

    // Hour slots start on the location's local hour, which is not always a
    // whole UTC hour; the current slot is the one that began within the last hour.
    let hourly = forecast
        .forecastday
        .iter()
        .flat_map(|fd| fd.hour.iter())
        .filter(|h| h.time_epoch > now_epoch - 3600)
        .take(HOURLY_WINDOW)
        .filter_map(|h| {
            let time = DateTime::from_timestamp(h.time_epoch, 0)?;
            Some(HourlyForecast {
                time,
                temperature_c: whole_degrees(h.temp_c),
                condition: h.condition.text.clone(),
                icon: h.condition.icon(),
                precipitation_mm: h.precip_mm,
                humidity_pct: h.humidity,
                wind_speed_mps: normalize::kph_to_mps(h.wind_kph),
            })
        })
        .collect();

    Ok(ForecastBundle {
        coordinates: location.coordinates(),
        location_name: location.name,
        country: location.country,
        daily,
        hourly,
    })
}

fn normalize_alerts(parsed: WaAlertsResponse) -> Vec<AlertRecord> {
    let alerts = match parsed.alerts {
        Some(WaAlertList::Flat(list)) | Some(WaAlertList::Nested { alert: list }) => list,
        None => Vec::new(),
    };

    alerts
        .into_iter()
        .map(|a| {
            let start = a
                .start
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .or_else(|| a.effective.map(|dt| dt.with_timezone(&Utc)))
                .unwrap_or_else(Utc::now);
            let end = a
                .end
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .or_else(|| a.expires.map(|dt| dt.with_timezone(&Utc)))
                .unwrap_or(start);

            AlertRecord {
                severity: normalize::alert_severity(&a.event),
                event: a.event,
                description: a.description,
                start,
                end,
                sender: a.sender_name,
                tags: a.tags,
            }
        })
        .collect()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
