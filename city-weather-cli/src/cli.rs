use anyhow::Context;
use city_weather_core::{Config, CoordinateQuery, WeatherInfo};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "city-weather", version, about = "Current weather for a city")]
pub struct Cli {
    /// Override the configured User-Agent (app name and contact address).
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the identification string and request timeout.
    Configure,

    /// Show the current weather for a place name.
    Show {
        /// City, optionally with country, e.g. "Stockholm, Sweden".
        city: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the current weather for a coordinate.
    Coords {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Metres above sea level.
        #[arg(long, allow_negative_numbers = true)]
        altitude: Option<f64>,

        /// Label to show instead of the coordinates.
        #[arg(long)]
        label: Option<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve a place name to coordinates.
    Geocode {
        query: String,

        /// Number of candidates to ask for; the first one is shown.
        #[arg(long, default_value_t = 1)]
        limit: u32,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        tracing::debug!(
            user_agent = %config.user_agent,
            timeout_secs = config.timeout_secs,
            "configuration loaded"
        );

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { city, json } => {
                let info = config.weather_service().get_weather_for_city(&city).await?;
                print_weather(&info, json)?;
            }
            Command::Coords { lat, lon, altitude, label, json } => {
                let mut query = CoordinateQuery::new(lat, lon);
                query.altitude = altitude;
                query.label = label;

                let info = config
                    .weather_client()
                    .get_weather_for_coordinates(&query)
                    .await?;
                print_weather(&info, json)?;
            }
            Command::Geocode { query, limit } => {
                let location = config
                    .geocoding_client()
                    .geocode_city_with_limit(&query, limit)
                    .await?;
                println!("{location}");
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    config.user_agent = Text::new("User agent (app name and contact e-mail):")
        .with_default(&config.user_agent)
        .prompt()?;

    config.timeout_secs = CustomType::<u64>::new("Request timeout in seconds:")
        .with_default(config.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn print_weather(info: &WeatherInfo, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(info).context("Failed to serialize weather")?;
        println!("{out}");
    } else {
        println!("Weather in {info}");
    }
    Ok(())
}
