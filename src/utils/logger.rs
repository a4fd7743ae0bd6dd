use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "site_audit=info";

/// Installs the global tracing subscriber, writing to a timestamped file in `log_dir`
///
/// # Returns
/// * `Result<PathBuf>` - Path of the log file being written
pub fn init_logger(log_dir: &str) -> Result<PathBuf> {
    if !Path::new(log_dir).exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir))?;
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_file = Path::new(log_dir).join(format!("site_audit_{}.log", timestamp));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(fs::File::create(&log_file)?)
        .finish();

    // also forwards `log` records from the validator
    subscriber.try_init()?;
    info!("Logger initialized, writing to {}", log_file.display());

    Ok(log_file)
}
