use anyhow::Context;
use clap::{Parser, Subcommand};

use citycast_core::{Config, Forecast, WeatherLookup};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "Five-day weather forecast for a city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key used for forecast requests.
    Configure,

    /// Show the five-day forecast for a city.
    Forecast {
        /// City name, e.g. "Paris" or "New York".
        city: String,

        /// Print the raw provider payload as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Forecast { city, json } => forecast(&city, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.api_key = Some(api_key.trim().to_string());
    config.save()?;

    println!("API key saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn forecast(city: &str, json: bool) -> anyhow::Result<()> {
    if city.trim().is_empty() {
        anyhow::bail!("City name must not be empty");
    }

    let config = Config::load()?;
    let api_key = config.resolve_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `citycast configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let lookup = WeatherLookup::new(api_key)?;

    match lookup.fetch_forecast(city).await {
        Ok(forecast) => print_forecast(&forecast, json),
        Err(err) if err.is_not_found() => Err(anyhow::anyhow!(
            "{err}\n\
             Hint: try a more specific query, e.g. \"Springfield,US\"."
        )),
        Err(err) => Err(err.into()),
    }
}

fn print_forecast(forecast: &Forecast, json: bool) -> anyhow::Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(forecast.as_value())
            .context("Failed to render forecast payload")?;
        println!("{rendered}");
        return Ok(());
    }

    match forecast.city_name() {
        Some(name) => println!("Forecast for {name}:"),
        None => println!("Forecast:"),
    }

    let entries = forecast.entries();
    if entries.is_empty() {
        println!("  (the provider returned no forecast entries)");
        return Ok(());
    }

    for entry in entries {
        println!(
            "  {}  {:>6.1} °C  {}",
            entry.time.format("%Y-%m-%d %H:%M UTC"),
            entry.temperature_c,
            entry.description
        );
    }

    Ok(())
}
