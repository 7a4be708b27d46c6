use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "TILEBOARD_LOG";
pub const LOG_FILE: &str = "tileboard.log";
const DEFAULT_FILTER: &str = "tileboard=info";

/// Install the global subscriber writing to `<data_dir>/tileboard.log`.
///
/// The returned guard flushes the non-blocking writer on drop and must live
/// until exit. Nothing goes to stdout or stderr: the TUI owns the terminal
/// and CLI output is meant to be parsed.
pub fn init(data_dir: &Path) -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.into());
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init();

    match installed {
        Ok(()) => {
            tracing::info!(dir = %data_dir.display(), "logging started");
            Some(guard)
        }
        Err(_) => None,
    }
}
