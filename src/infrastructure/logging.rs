use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::DomainError;

const LOG_FILE: &str = "lyricsync.log";

/// Filter directive for the crate at `level`, with dependencies held at warn.
fn default_directive(level: &str) -> String {
    format!("lyricsync={},warn", level)
}

/// Initialize console logging plus, if enabled, a daily-rotated JSON log file.
///
/// `RUST_LOG` overrides the configured level for the console. The returned
/// guard flushes the file writer when dropped and must outlive the application.
/// Calling this twice leaves the first subscriber in place.
pub fn init_logging(
    logs_dir: &Path,
    level: &str,
    file_logging: bool,
) -> Result<Option<WorkerGuard>, DomainError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if !file_logging {
        let _ = tracing_subscriber::registry()
            .with(console_layer)
            .try_init();
        tracing::info!(level, "Logging initialized (console only)");
        return Ok(None);
    }

    fs::create_dir_all(logs_dir)?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(EnvFilter::new(format!("lyricsync={}", level)));

    if tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(logs_dir = ?logs_dir, level, "Logging initialized with file output");
    }

    Ok(Some(guard))
}
