mod load;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use storelocator_core::{config_dir, load_settings_or_default, SettingsSource};
use tracing_subscriber::EnvFilter;

use crate::load::LoadCommand;

#[derive(Debug, Parser)]
#[command(name = "storelocator")]
#[command(about = "Command line interface for the storelocator service")]
struct Cli {
    /// Config file (defaults to $HOME/.storelocator/config.yaml)
    #[arg(long, global = true, env = "STORELOCATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load store data from a CSV file into BigQuery and notify the indexer
    Load(LoadCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config_dir = config_dir(|key| std::env::var(key)).ok();
    let loaded = load_settings_or_default(cli.config.as_deref(), config_dir.as_deref())?;
    let settings = loaded.settings;

    let log_level = settings.log_level.as_deref().unwrap_or("info");
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    log_settings_source(&loaded.source);
    tracing::debug!(?config_dir, ?settings, "configuration loaded");

    match command {
        Commands::Load(args) => {
            load::run_load_command(args, settings, config_dir.as_deref()).await
        }
    }
}

fn log_settings_source(source: &SettingsSource) {
    match source {
        SettingsSource::Explicit(path) | SettingsSource::Default(path) => {
            tracing::info!(path = %path.display(), "loaded config file");
        }
        SettingsSource::Missing(path) => {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
        }
        SettingsSource::NoConfigDir => {
            tracing::info!("HOME is not set and no --config given, using defaults");
        }
    }
}
