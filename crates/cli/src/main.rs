use std::process::ExitCode;

use anyhow::{anyhow, Result};
use foodie_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` directives win over the configured level.
fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&logging.level))
}

fn level_filter(level: &str) -> EnvFilter {
    let level = level.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    EnvFilter::default().add_directive(level.into())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter(logging))
        .with_writer(std::io::stderr);

    // stdout carries the command JSON, so logs go to stderr
    let initialized = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    initialized.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn main() -> Result<ExitCode> {
    // Commands report config errors themselves; logging falls back to defaults.
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&config.logging)?;

    Ok(foodie_cli::run())
}
