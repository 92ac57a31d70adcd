//! Logging initialization with environment-based formatters.
//!
//! - Production: structured JSON logs for cloud monitoring
//! - Sandbox: colorful, human-readable logs for development
//!
//! Every run also appends to `logs/<run_name>.log` so a cycle can be
//! diagnosed after the fact without re-running it.

use std::fs::{self, File, OpenOptions};
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::get_environment;

fn open_log_file(run_name: &str) -> std::io::Result<File> {
    fs::create_dir_all("logs")?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(format!("logs/{run_name}.log"))
}

/// Initialize logging based on the environment.
pub fn init_logging(run_name: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let is_production = matches!(get_environment().as_str(), "production" | "prod");

    let log_file = match open_log_file(run_name) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("failed to open log file for run '{run_name}': {e}");
            None
        }
    };

    if is_production {
        let file_layer =
            log_file.map(|file| fmt::layer().with_ansi(false).with_writer(Arc::new(file)));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stdout),
            )
            .with(file_layer)
            .init();
    } else {
        let file_layer =
            log_file.map(|file| fmt::layer().with_ansi(false).with_writer(Arc::new(file)));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(file_layer)
            .init();
    }
}
