use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use safeweather_core::{Config, Coordinates, WeatherService};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "safeweather", version, about = "School-transport weather alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude in decimal degrees; defaults to the configured location.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees; defaults to the configured location.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl LocationArgs {
    fn coordinates(&self, config: &Config) -> Coordinates {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => config.location.coordinates(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the WeatherAPI.com key and default location.
    Configure,

    /// Current conditions.
    Current(LocationArgs),

    /// Daily and hourly forecast.
    Forecast(LocationArgs),

    /// Active weather alerts.
    Alerts(LocationArgs),

    /// Air quality.
    Air(LocationArgs),

    /// Everything at once.
    Report(LocationArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Current(args) => {
                let (service, coords) = connect(&config, &args)?;
                let current = service.get_current_weather(coords).await;
                emit(args.json, &current, || output::current(&current))
            }
            Command::Forecast(args) => {
                let (service, coords) = connect(&config, &args)?;
                let forecast = service.get_weather_forecast(coords).await;
                emit(args.json, &forecast, || output::forecast(&forecast))
            }
            Command::Alerts(args) => {
                let (service, coords) = connect(&config, &args)?;
                let alerts = service.get_weather_alerts(coords).await;
                emit(args.json, &alerts, || output::alerts(&alerts))
            }
            Command::Air(args) => {
                let (service, coords) = connect(&config, &args)?;
                let air = service.get_air_quality(coords).await;
                emit(args.json, &air, || output::air_quality(&air))
            }
            Command::Report(args) => {
                let (service, coords) = connect(&config, &args)?;
                match service.update_weather_for_location(coords).await {
                    Some(report) => emit(args.json, &report, || output::report(&report)),
                    None => Ok(()),
                }
            }
        }
    }
}

fn connect(config: &Config, args: &LocationArgs) -> Result<(WeatherService, Coordinates)> {
    let service = WeatherService::from_config(config)?;
    Ok((service, args.coordinates(config)))
}

fn emit<T: serde::Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> Result<String, std::fmt::Error>,
) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{json}");
    } else {
        print!("{}", text().context("Failed to render output")?);
    }
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = Password::new("WeatherAPI.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get a free key at https://www.weatherapi.com/my/")
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let base_url = Text::new("API base URL:")
        .with_default(&config.provider.base_url)
        .prompt()
        .context("Failed to read base URL")?;
    config.provider.base_url = base_url;

    config.location.latitude = CustomType::<f64>::new("Default latitude:")
        .with_default(config.location.latitude)
        .prompt()
        .context("Failed to read latitude")?;
    config.location.longitude = CustomType::<f64>::new("Default longitude:")
        .with_default(config.location.longitude)
        .prompt()
        .context("Failed to read longitude")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    if !config.is_configured() {
        println!("Warning: the API key is empty or still the placeholder; demo data will be shown.");
    }

    Ok(())
}
