//! Logging initialization
//!
//! Console output plus a daily-rolling file under `logs/`, filtered by
//! `RUST_LOG` with an info default. The non-blocking writer guard is kept in
//! a global so file logging survives for the life of the process.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Installs the global subscriber. Call once, before the pipeline starts.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(log_dir, "stay-crawler.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    if let Ok(mut guards) = LOG_GUARDS.lock() {
        guards.push(guard);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    Ok(())
}
