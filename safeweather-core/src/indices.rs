//! Derived comfort and transport-risk indices.

use serde::Serialize;

use crate::model::WeatherSnapshot;

/// A label with its display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub label: &'static str,
    pub color: &'static str,
}

const LOW: Rating = Rating { label: "Low", color: "#10b981" };
const MEDIUM: Rating = Rating { label: "Medium", color: "#f59e0b" };
const HIGH: Rating = Rating { label: "High", color: "#ef4444" };

/// Simplified heat index in °C; unchanged below 27 °C.
pub fn heat_index(temp_c: f64, humidity_pct: f64) -> f64 {
    if temp_c < 27.0 {
        return temp_c;
    }

    const C1: f64 = -8.784_694_755_56;
    const C2: f64 = 1.611_394_11;
    const C3: f64 = 2.338_548_838_89;
    const C4: f64 = -0.146_116_05;
    const C5: f64 = -0.012_308_094;
    const C6: f64 = -0.016_424_827_777_8;
    const C7: f64 = 0.002_211_732;
    const C8: f64 = 0.000_725_46;
    const C9: f64 = -0.000_003_582;

    let t = temp_c;
    let r = humidity_pct;

    C1 + C2 * t + C3 * r + C4 * t * r + C5 * t * t + C6 * r * r + C7 * t * t * r
        + C8 * t * r * r
        + C9 * t * t * r * r
}

/// Wind chill in °C for wind in km/h; unchanged above 10 °C or below 4.8 km/h.
pub fn wind_chill(temp_c: f64, wind_kph: f64) -> f64 {
    if temp_c > 10.0 || wind_kph < 4.8 {
        return temp_c;
    }

    let v = wind_kph.powf(0.16);
    13.12 + 0.6215 * temp_c - 11.37 * v + 0.3965 * temp_c * v
}

pub fn uv_level(index: f64) -> Rating {
    if index <= 2.0 {
        LOW
    } else if index <= 5.0 {
        Rating { label: "Moderate", color: "#f59e0b" }
    } else if index <= 7.0 {
        HIGH
    } else if index <= 10.0 {
        Rating { label: "Very High", color: "#7c3aed" }
    } else {
        Rating { label: "Extreme", color: "#991b1b" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrecipitationType {
    Snow,
    Sleet,
    Rain,
}

pub fn precipitation_type(temp_c: f64) -> PrecipitationType {
    if temp_c <= 0.0 {
        PrecipitationType::Snow
    } else if temp_c <= 3.0 {
        PrecipitationType::Sleet
    } else {
        PrecipitationType::Rain
    }
}

/// Scores a snapshot for school-transport risk.
pub fn risk_level(snapshot: &WeatherSnapshot) -> Rating {
    let mut score = 0;

    if snapshot.temperature_c > 35.0 || snapshot.temperature_c < 10.0 {
        score += 2;
    }

    let condition = &snapshot.condition.text;
    if condition.contains("Rain") || condition.contains("rain") || condition.contains("Snow")
        || condition.contains("snow")
    {
        score += 2;
    }

    let wind_kph = snapshot.wind_speed_mps * 3.6;
    if wind_kph > 30.0 {
        score += 3;
    } else if wind_kph > 20.0 {
        score += 1;
    }

    if snapshot.visibility_km < 1.0 {
        score += 3;
    } else if snapshot.visibility_km < 5.0 {
        score += 1;
    }

    match score {
        s if s >= 6 => HIGH,
        s if s >= 3 => MEDIUM,
        _ => LOW,
    }
}
