//! Logging for cbtprobe.
use anyhow::Context;
use cbtprobe_core::log_paths;
use std::io::LineWriter;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::OffsetTime;

const MAX_LOG_BYTES: u64 = 100 * 1024;

/// Initializes file logging at `<data_dir>/cbtprobe.log`.
///
/// A log larger than 100KB is moved to `cbtprobe.log.old` first, replacing
/// any previous backup. Every request, response and console message of the
/// run is mirrored into the log at debug level.
///
/// # Errors
///
/// Fails when the data directory cannot be created, the log cannot be
/// rotated or opened.
pub fn setup_logging() -> anyhow::Result<()> {
    let paths = log_paths().context("Failed to get data directory")?;
    paths
        .rotate(MAX_LOG_BYTES)
        .context("Failed to rotate log file")?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.current)
        .with_context(|| format!("Failed to open {}", paths.current.display()))?;

    // Flush after every line so an interrupted run keeps its log
    let writer = Mutex::new(LineWriter::new(log_file));

    let builder = tracing_subscriber::fmt()
        .with_env_filter("cbtprobe=debug,cbtprobe_core=debug")
        .with_writer(writer)
        .with_ansi(false);

    // The local offset is unavailable once other threads are running; fall back to UTC
    match OffsetTime::local_rfc_3339() {
        Ok(timer) => builder.with_timer(timer).init(),
        Err(_) => builder.init(),
    }
    Ok(())
}
