/// Tracing subscriber setup.
///
/// The TUI owns the terminal, so interactive sessions log to a file under the
/// state dir. One-shot commands may log to stderr instead.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "QUICKNEWS_LOG";
const DEFAULT_FILTER: &str = "quicknews=info";
const LOG_FILE: &str = "quicknews.log";

pub enum LogTarget<'a> {
    /// Append to `quicknews.log` inside this directory
    File(&'a Path),
    Stderr,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn log_file(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE)
}

/// Install the global subscriber. Returns the log file path when logging to a file.
pub fn init(target: LogTarget<'_>) -> Result<Option<PathBuf>> {
    let registry = tracing_subscriber::registry().with(filter());
    match target {
        LogTarget::Stderr => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
            Ok(None)
        }
        LogTarget::File(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let path = log_file(dir);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?;
            Ok(Some(path))
        }
    }
}
