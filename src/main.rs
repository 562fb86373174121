mod cache;
mod cli;
mod error;
mod fmt;
mod importer;
mod models;
mod networth;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::{prelude::*, EnvFilter};

use cli::{Cli, Commands};
use settings::Settings;

/// `--log-level` wins, then `RUST_LOG`, then the settings file.
fn setup_logging(flag: Option<&str>, configured: &str) {
    let filter = match flag {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .or_else(|| EnvFilter::try_new(configured).ok())
    .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();

    let settings = match settings::load_settings() {
        // init may run over a broken file
        Err(e) if matches!(cli.command, Commands::Init { .. }) => {
            eprintln!("Warning: ignoring unreadable settings ({e})");
            Ok(Settings::default())
        }
        loaded => loaded,
    };

    let result = settings.and_then(|settings| {
        setup_logging(cli.log_level.as_deref(), &settings.log_level);
        cli::run(cli, settings)
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
