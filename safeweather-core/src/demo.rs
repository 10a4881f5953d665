//! Static payloads served when the provider is unavailable or unconfigured.

use chrono::{Duration, Local, Utc};

use crate::{
    config::DEFAULT_LOCATION,
    model::{
        AirQualityReading, AlertRecord, AqiTier, Condition, DailyForecast, ForecastBundle,
        HourlyForecast, Pollutants, WeatherSnapshot, WindDirection,
    },
    normalize,
};

const DEMO_LOCATION: &str = "Batu Pahat";
const DEMO_COUNTRY: &str = "MY";

pub fn current_weather() -> WeatherSnapshot {
    let today = Local::now().date_naive();

    WeatherSnapshot {
        temperature_c: 32.0,
        feels_like_c: 34.0,
        humidity_pct: 65,
        pressure_mb: 1013.0,
        wind_speed_mps: normalize::kph_to_mps(12.0),
        wind_direction: WindDirection::NE,
        visibility_km: 10.0,
        cloud_pct: 20,
        condition: Condition {
            text: "Clear".to_string(),
            icon: normalize::condition_icon(1000).to_string(),
            code: 1000,
        },
        sunrise: normalize::at_hour(today, 7),
        sunset: normalize::at_hour(today, 19),
        location_name: DEMO_LOCATION.to_string(),
        coordinates: DEFAULT_LOCATION,
        observation_time: Utc::now(),
        air_quality: None,
    }
}

/// Five days and eight three-hour steps.
pub fn forecast() -> ForecastBundle {
    let now = Utc::now();
    let today = Local::now().date_naive();

    let daily = (0..5u8)
        .map(|i| {
            let offset = f64::from(i);
            let clear = i % 2 == 0;
            DailyForecast {
                date: today + Duration::days(i64::from(i)),
                min_temp_c: 25.0 + offset,
                max_temp_c: 32.0 + offset,
                avg_temp_c: 28.0 + offset,
                condition: if clear { "Clear" } else { "Clouds" }.to_string(),
                icon: if clear { "fas fa-sun" } else { "fas fa-cloud" }.to_string(),
                humidity_pct: 60.0 + offset * 5.0,
                wind_speed_mps: normalize::kph_to_mps(10.0 + offset),
                precipitation_mm: if i == 2 { 5.0 } else { 0.0 },
            }
        })
        .collect();

    let hourly = (0..8u8)
        .map(|i| {
            let offset = f64::from(i);
            let clear = i < 4;
            HourlyForecast {
                time: now + Duration::hours(i64::from(i) * 3),
                temperature_c: 28.0 + offset.sin() * 4.0,
                condition: if clear { "Clear" } else { "Clouds" }.to_string(),
                icon: if clear { "fas fa-sun" } else { "fas fa-cloud" }.to_string(),
                precipitation_mm: if i == 6 { 2.0 } else { 0.0 },
                humidity_pct: 60 + i * 3,
                wind_speed_mps: normalize::kph_to_mps(8.0 + offset),
            }
        })
        .collect();

    ForecastBundle {
        location_name: DEMO_LOCATION.to_string(),
        country: DEMO_COUNTRY.to_string(),
        coordinates: DEFAULT_LOCATION,
        daily,
        hourly,
    }
}

pub fn alerts() -> Vec<AlertRecord> {
    let now = Utc::now();
    let event = "Thunderstorm Warning";

    vec![AlertRecord {
        event: event.to_string(),
        description: "Thunderstorms with heavy rain expected in the area. Exercise caution."
            .to_string(),
        start: now,
        end: now + Duration::hours(3),
        sender: "MET Malaysia".to_string(),
        severity: normalize::alert_severity(event),
        tags: vec!["thunderstorm".to_string(), "rain".to_string()],
    }]
}

pub fn air_quality() -> AirQualityReading {
    AirQualityReading {
        tier: AqiTier::Fair,
        pollutants: Pollutants {
            pm2_5: 12.3,
            pm10: 25.6,
            co: 250.5,
            no2: 15.2,
            o3: 60.8,
            so2: 2.1,
        },
    }
}
