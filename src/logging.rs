/// Logging configuration.
///
/// Logs go to stderr by default. When a log directory is given they are
/// appended to `{log_dir}/wrapped.log` instead, each run starting with a
/// separator line.
use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "wrapped.log";

/// Initializes logging for one run.
///
/// # Arguments
///
/// * `log_dir` - Directory for the log file, or `None` to log to stderr
pub fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    // Default to INFO level, but allow override via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok(); // Ignore error if already initialized
        return Ok(());
    };

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Write run separator with timestamp before the appender opens the file
    let separator = format!(
        "\n{sep}\n[{ts}] New wrapped run\n{sep}\n",
        sep = "=".repeat(80),
        ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE))
            .with_context(|| format!("Failed to open log file in: {}", log_dir.display()))?;
        writeln!(file, "{}", separator).context("Failed to write log separator")?;
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok(); // Ignore error if already initialized

    tracing::info!("Logging initialized in {}", log_dir.display());

    Ok(())
}
