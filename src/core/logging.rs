//! Logging setup and console output helpers.
//!
//! Provides:
//! - A daily-rolling JSON file log under `<data dir>/logs`
//! - A stderr layer for one-shot CLI commands (never in TUI mode)
//! - `log` crate bridging so dependency logs land in the same sink
//! - Background gzip of logs from previous days
//! - Styled success/error lines for CLI output (console)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use console::style;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "dm-assistant.log";

const DEFAULT_FILTER: &str = "info";

/// Initialize logging for one-shot CLI commands.
///
/// Writes JSON to the rolling file and a compact human-readable format to
/// stderr, so stdout stays clean for command output.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of the
/// application so buffered file logs are flushed on shutdown.
pub fn init(log_dir: &Path) -> WorkerGuard {
    install(log_dir, true)
}

/// Initialize logging for TUI mode.
///
/// Identical to [`init()`] but without the stderr layer: ratatui owns the
/// terminal while in raw/alternate-screen mode.
pub fn init_tui(log_dir: &Path) -> WorkerGuard {
    install(log_dir, false)
}

fn install(log_dir: &Path, with_stderr: bool) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter.clone());

    let stderr_layer = with_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(false)
            .with_filter(env_filter)
    });

    // try_init also installs the `log` bridge when the tracing-log feature
    // is on; fall back to installing it by hand otherwise.
    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    } else if tracing_log::LogTracer::init().is_ok() {
        tracing::trace!("log bridge installed");
    }

    let dir = log_dir.to_path_buf();
    std::thread::spawn(move || {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        compress_old_logs(&dir, &today);
    });

    tracing::info!(
        path = %log_dir.join(LOG_FILE_NAME).display(),
        "logging initialized (daily rolling)"
    );

    guard
}

/// Gzip rolled log files that are not today's.
///
/// Returns the paths of the archives that were written.
fn compress_old_logs(log_dir: &Path, today_suffix: &str) -> Vec<PathBuf> {
    let prefix = format!("{}.", LOG_FILE_NAME);
    let mut compressed = Vec::new();

    let Ok(entries) = fs::read_dir(log_dir) else {
        return compressed;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(&prefix) || name.ends_with(today_suffix) || name.ends_with(".gz") {
            continue;
        }

        match compress_file(&path) {
            Ok(Some(gz_path)) => {
                tracing::info!(path = %path.display(), "compressed old log");
                compressed.push(gz_path);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to compress old log"),
        }
    }

    compressed
}

/// Compress `path` into `path.gz` and remove the original.
/// Returns `None` if the archive already exists.
fn compress_file(path: &Path) -> io::Result<Option<PathBuf>> {
    let mut gz_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let gz_path = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?
        .join(gz_name);

    if gz_path.exists() {
        return Ok(None);
    }

    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(Some(gz_path))
}

// ============================================================================
// Console Output Utilities
// ============================================================================

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green(), style(message).green());
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red(), style(message).red().bold());
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), style(message).yellow().bold());
}
