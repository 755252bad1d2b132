//! Logging setup: a compact console layer plus an optional file layer.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Installs the global subscriber. The console prints at the requested
/// level; the file, when given, receives the same stream without ANSI
/// colors.
pub fn init(level: LogLevel, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::new(level.as_directive());

    let console = fmt::layer().with_target(false).compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = Arc::new(
                File::create(path)
                    .with_context(|| format!("cannot create log file {}", path.display()))?,
            );
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(move || Arc::clone(&file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    Ok(())
}
