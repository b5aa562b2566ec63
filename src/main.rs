use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mapweather::api::AppState;
use mapweather::config::MapWeatherConfig;
use mapweather::service::OpenMeteoService;
use mapweather::{VERSION, logging, web};

/// Pick a point on the map, get its weather
#[derive(Debug, Parser)]
#[command(name = "mapweather", version, about)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MapWeatherConfig::load_from_path(cli.config)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    logging::init(&config.logging)?;

    info!("MapWeather {} starting", VERSION);
    let service =
        OpenMeteoService::from_config(&config).context("Failed to set up upstream clients")?;

    web::run(&config.server, AppState::new(service)).await
}
