use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};
use ytvconfig::Config;

fn level_from_config(config: &Config) -> LevelFilter {
    config
        .get_log_min_level()
        .ok()
        .and_then(|level| LevelFilter::from_str(level.trim()).ok())
        .unwrap_or(LevelFilter::INFO)
}

/// Installs the global subscriber: a level filter, a plain-text file layer
/// and, if enabled, a console layer.
pub fn init_logging(config: &Config) -> Result<()> {
    let level = level_from_config(config);

    let log_file = config.get_log_file()?;
    let file = OpenOptions::new().create(true).append(true).open(&log_file)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    let enable_console = config.get_log_enable_console().unwrap_or(true);
    let console_layer = enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    Registry::default()
        .with(level)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    tracing::debug!(file = %log_file.display(), level = %level, "Logging initialized");
    Ok(())
}
