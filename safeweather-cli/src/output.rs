//! Plain-text rendering of service results.

use std::fmt::{self, Write};

use safeweather_core::{
    AirQualityReading, AlertRecord, Fetched, ForecastBundle, WeatherReport, WeatherSnapshot,
    indices,
};

type Rendered = Result<String, fmt::Error>;

fn source_note<T>(fetched: &Fetched<T>) -> String {
    match fetched.reason() {
        None => String::new(),
        Some(reason) => format!(" [demo data: {reason}]"),
    }
}

pub fn current(fetched: &Fetched<WeatherSnapshot>) -> Rendered {
    let w = fetched.data();
    let mut out = String::new();

    writeln!(out, "{} ({}){}", w.location_name, w.coordinates, source_note(fetched))?;
    writeln!(out, "  {:<12} {}", "Condition", w.condition.text)?;
    writeln!(
        out,
        "  {:<12} {:.0}°C (feels like {:.0}°C)",
        "Temperature", w.temperature_c, w.feels_like_c
    )?;
    writeln!(out, "  {:<12} {}%", "Humidity", w.humidity_pct)?;
    writeln!(
        out,
        "  {:<12} {:.1} km/h {}",
        "Wind",
        w.wind_speed_mps * 3.6,
        w.wind_direction
    )?;
    writeln!(out, "  {:<12} {:.0} mb", "Pressure", w.pressure_mb)?;
    writeln!(out, "  {:<12} {:.1} km", "Visibility", w.visibility_km)?;
    writeln!(out, "  {:<12} {}%", "Clouds", w.cloud_pct)?;
    writeln!(
        out,
        "  {:<12} {} / {}",
        "Sun",
        w.sunrise.format("%H:%M"),
        w.sunset.format("%H:%M")
    )?;

    let risk = indices::risk_level(w);
    writeln!(out, "  {:<12} {}", "Travel risk", risk.label)?;
    writeln!(
        out,
        "  {:<12} {:.0}°C",
        "Heat index",
        indices::heat_index(w.temperature_c, f64::from(w.humidity_pct))
    )?;
    writeln!(out, "  {:<12} {}", "Observed", w.observation_time.format("%Y-%m-%d %H:%M UTC"))?;

    Ok(out)
}

pub fn forecast(fetched: &Fetched<ForecastBundle>) -> Rendered {
    let f = fetched.data();
    let mut out = String::new();

    writeln!(out, "{}, {}{}", f.location_name, f.country, source_note(fetched))?;

    for day in &f.daily {
        writeln!(
            out,
            "  {}  {:>3.0}° / {:>3.0}°  {:>5.1} mm  {}",
            day.date.format("%a %d %b"),
            day.max_temp_c,
            day.min_temp_c,
            day.precipitation_mm,
            day.condition
        )?;
    }

    if !f.hourly.is_empty() {
        writeln!(out, "  Next hours:")?;
        for hour in &f.hourly {
            writeln!(
                out,
                "    {}  {:>3.0}°  {:>4.1} mm  {}",
                hour.time.format("%H:%M"),
                hour.temperature_c,
                hour.precipitation_mm,
                hour.condition
            )?;
        }
    }

    Ok(out)
}

pub fn alerts(fetched: &Fetched<Vec<AlertRecord>>) -> Rendered {
    let mut out = String::new();
    let list = fetched.data();

    if list.is_empty() {
        writeln!(out, "No active weather alerts{}", source_note(fetched))?;
        return Ok(out);
    }

    writeln!(out, "{} active alert(s){}", list.len(), source_note(fetched))?;
    for alert in list {
        let marker = if alert.is_critical() { "!!" } else { "--" };
        writeln!(
            out,
            "  {marker} [{}] {} (until {}, {})",
            alert.severity,
            alert.event,
            alert.end.format("%H:%M"),
            alert.sender
        )?;
        if !alert.description.is_empty() {
            writeln!(out, "     {}", alert.description)?;
        }
    }

    Ok(out)
}

pub fn air_quality(fetched: &Fetched<AirQualityReading>) -> Rendered {
    let aq = fetched.data();
    let mut out = String::new();

    writeln!(
        out,
        "Air quality: {} ({}){}",
        aq.tier.index(),
        aq.tier.label(),
        source_note(fetched)
    )?;
    writeln!(out, "  PM2.5 {:.1} µg/m³  PM10 {:.1} µg/m³", aq.pollutants.pm2_5, aq.pollutants.pm10)?;
    writeln!(
        out,
        "  CO {:.1}  NO2 {:.1}  O3 {:.1}  SO2 {:.1}",
        aq.pollutants.co, aq.pollutants.no2, aq.pollutants.o3, aq.pollutants.so2
    )?;

    Ok(out)
}

pub fn report(report: &WeatherReport) -> Rendered {
    let mut out = String::new();

    for alert in report.critical_alerts() {
        writeln!(out, "ALERT: {}", alert.event)?;
    }

    writeln!(out, "{}", current(&report.current)?)?;
    writeln!(out, "{}", air_quality(&report.air_quality)?)?;
    writeln!(out, "{}", alerts(&report.alerts)?)?;
    out.push_str(&forecast(&report.forecast)?);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeweather_core::{FallbackReason, demo};

    #[test]
    fn fallback_is_marked() {
        let text = current(&Fetched::fallback(demo::current_weather(), FallbackReason::Status(500)))
            .expect("render");
        assert!(text.contains("[demo data: provider returned HTTP 500]"));
        assert!(text.contains("Batu Pahat"));
    }

    #[test]
    fn live_is_unmarked() {
        let text = forecast(&Fetched::live(demo::forecast())).expect("render");
        assert!(!text.contains("demo data"));
        assert!(text.contains("Next hours:"));
    }

    #[test]
    fn empty_alerts_message() {
        let text = alerts(&Fetched::live(Vec::new())).expect("render");
        assert!(text.starts_with("No active weather alerts"));
    }

    #[test]
    fn demo_wind_renders_in_kmh() {
        let text = current(&Fetched::live(demo::current_weather())).expect("render");
        assert!(text.contains("12.0 km/h NE"));
        assert!(text.contains("Travel risk  Low"));
    }

    #[test]
    fn report_leads_with_critical_alerts() {
        let report = WeatherReport {
            current: Fetched::live(demo::current_weather()),
            forecast: Fetched::live(demo::forecast()),
            alerts: Fetched::live(demo::alerts()),
            air_quality: Fetched::live(demo::air_quality()),
        };

        let text = super::report(&report).expect("render");
        assert!(text.starts_with("ALERT: Thunderstorm Warning"));
        assert!(text.contains("Air quality: 2 (Fair)"));
    }
}
