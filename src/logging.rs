//! File-backed logger. The terminal belongs to the TUI, so log records go to
//! the configured log file instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

/// Install the global logger, appending to `path`.
pub fn init_logging(path: &Path, level: LevelFilter) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();

    WriteLogger::init(level, config, file).context("failed to install logger")?;
    log::info!("logging to {} at level {level}", path.display());
    Ok(())
}
