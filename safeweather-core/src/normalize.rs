//! Unit conversions and lookup tables shared by every provider.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::{AlertSeverity, AqiTier, WindDirection};

pub const UNKNOWN_ICON: &str = "fas fa-question";

const SUNRISE_PLACEHOLDER_HOUR: u32 = 6;
const SUNSET_PLACEHOLDER_HOUR: u32 = 18;

pub fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

/// Buckets degrees into eight compass points: `round(deg / 45) mod 8`.
pub fn wind_direction(degrees: f64) -> WindDirection {
    let bucket = (degrees / 45.0).round() as i64;
    WindDirection::ALL[bucket.rem_euclid(8) as usize]
}

/// Maps a WeatherAPI.com condition code to a display icon class.
pub fn condition_icon(code: u32) -> &'static str {
    match code {
        1000 => "fas fa-sun",
        1003 => "fas fa-cloud-sun",
        1006 | 1009 => "fas fa-cloud",
        1030 | 1135 | 1147 => "fas fa-smog",
        1063 | 1072 | 1150 | 1153 | 1168 | 1171 | 1180 | 1183 | 1186 | 1189 | 1192 | 1195
        | 1198 | 1201 => "fas fa-cloud-rain",
        1066 | 1069 | 1114 | 1117 | 1210 | 1213 | 1216 | 1219 | 1222 | 1225 | 1237 | 1249
        | 1252 | 1255 | 1258 | 1261 | 1264 => "fas fa-snowflake",
        1087 | 1273 | 1276 | 1279 | 1282 => "fas fa-bolt",
        _ => UNKNOWN_ICON,
    }
}

pub fn aqi_from_pm25(pm25: f64) -> AqiTier {
    if pm25 <= 12.0 {
        AqiTier::Good
    } else if pm25 <= 35.0 {
        AqiTier::Fair
    } else if pm25 <= 55.0 {
        AqiTier::Moderate
    } else if pm25 <= 150.0 {
        AqiTier::Poor
    } else {
        AqiTier::VeryPoor
    }
}

/// First matching keyword rule wins.
pub fn alert_severity(event: &str) -> AlertSeverity {
    let event = event.to_lowercase();

    if event.contains("warning") || event.contains("extreme") {
        AlertSeverity::Critical
    } else if event.contains("watch") || event.contains("advisory") {
        AlertSeverity::Warning
    } else {
        AlertSeverity::Info
    }
}

/// Parses an astronomy time such as `"06:58 AM"` on the given local date.
pub fn astro_time(date: NaiveDate, value: &str) -> Option<NaiveDateTime> {
    NaiveTime::parse_from_str(value.trim(), "%I:%M %p")
        .ok()
        .map(|time| date.and_time(time))
}

/// Fixed 06:00 placeholder; not a solar-position calculation.
pub fn placeholder_sunrise(date: NaiveDate) -> NaiveDateTime {
    at_hour(date, SUNRISE_PLACEHOLDER_HOUR)
}

/// Fixed 18:00 placeholder; not a solar-position calculation.
pub fn placeholder_sunset(date: NaiveDate) -> NaiveDateTime {
    at_hour(date, SUNSET_PLACEHOLDER_HOUR)
}

pub(crate) fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default())
}

/// Rounds half away from zero to a whole degree.
pub fn whole_degrees(value: f64) -> f64 {
    value.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_direction_buckets() {
        assert_eq!(wind_direction(0.0), WindDirection::N);
        assert_eq!(wind_direction(22.0), WindDirection::N);
        assert_eq!(wind_direction(44.0), WindDirection::NE);
        assert_eq!(wind_direction(45.0), WindDirection::NE);
        assert_eq!(wind_direction(180.0), WindDirection::S);
        assert_eq!(wind_direction(290.0), WindDirection::W);
        assert_eq!(wind_direction(359.0), WindDirection::N);
    }

    #[test]
    fn wind_speed_is_converted_to_mps() {
        assert!((kph_to_mps(36.0) - 10.0).abs() < 1e-9);
        assert_eq!(kph_to_mps(0.0), 0.0);
    }

    #[test]
    fn aqi_breakpoints() {
        assert_eq!(aqi_from_pm25(0.0), AqiTier::Good);
        assert_eq!(aqi_from_pm25(12.0), AqiTier::Good);
        assert_eq!(aqi_from_pm25(12.1), AqiTier::Fair);
        assert_eq!(aqi_from_pm25(35.0), AqiTier::Fair);
        assert_eq!(aqi_from_pm25(55.0), AqiTier::Moderate);
        assert_eq!(aqi_from_pm25(150.0), AqiTier::Poor);
        assert_eq!(aqi_from_pm25(200.0), AqiTier::VeryPoor);
    }

    #[test]
    fn alert_severity_keywords() {
        assert_eq!(alert_severity("Flood Warning"), AlertSeverity::Critical);
        assert_eq!(alert_severity("EXTREME heat"), AlertSeverity::Critical);
        assert_eq!(alert_severity("Flood Watch"), AlertSeverity::Warning);
        assert_eq!(alert_severity("Air quality advisory"), AlertSeverity::Warning);
        assert_eq!(alert_severity("Weather Update"), AlertSeverity::Info);
        // "warning" is checked before "watch"
        assert_eq!(alert_severity("Watch upgraded to warning"), AlertSeverity::Critical);
    }

    #[test]
    fn condition_icons() {
        assert_eq!(condition_icon(1000), "fas fa-sun");
        assert_eq!(condition_icon(1195), "fas fa-cloud-rain");
        assert_eq!(condition_icon(1282), "fas fa-bolt");
        assert_eq!(condition_icon(42), UNKNOWN_ICON);
    }

    #[test]
    fn astro_times_parse_on_local_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
        let sunrise = astro_time(date, "07:05 AM").expect("sunrise");
        assert_eq!(sunrise.to_string(), "2025-03-01 07:05:00");
        let sunset = astro_time(date, "07:17 PM").expect("sunset");
        assert_eq!(sunset.to_string(), "2025-03-01 19:17:00");
        assert!(astro_time(date, "not a time").is_none());
    }

    #[test]
    fn placeholders_are_six_and_eighteen() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
        assert_eq!(placeholder_sunrise(date).to_string(), "2025-03-01 06:00:00");
        assert_eq!(placeholder_sunset(date).to_string(), "2025-03-01 18:00:00");
    }
}
