//! Console and file logging.
//!
//! Log files rotate daily; files older than the retention period are
//! removed at startup.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_NAME: &str = "vtuner-ctl.log";

/// Install the global subscriber and bridge `log` records into it.
///
/// The filter comes from `RUST_LOG` when set, else `debug` with `verbose`,
/// else `level` (default `info`).
pub fn init_logging(
    log_dir: &Path,
    retention_days: u64,
    verbose: bool,
    level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(log_dir)?;
    clean_old_logs(log_dir, retention_days)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Flushes on drop; keep it for the whole run.
    let _ = Box::leak(Box::new(Arc::new(guard)));

    let default_level = if verbose { "debug" } else { level.unwrap_or("info") };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_timer(LocalTimeTimer),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_timer(LocalTimeTimer),
        );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set default subscriber: {}", e))?;
    tracing_log::LogTracer::init().map_err(|e| format!("Failed to initialize LogTracer: {}", e))?;

    Ok(())
}

fn is_log_file(name: &str) -> bool {
    name.starts_with(LOG_FILE_NAME)
}

fn clean_old_logs(log_dir: &Path, retention_days: u64) -> io::Result<()> {
    if !log_dir.exists() {
        return Ok(());
    }

    let cutoff = Local::now() - chrono::Duration::days(retention_days as i64);

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let old_log = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, is_log_file)
            && entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|t| chrono::DateTime::<Local>::from(t) < cutoff)
                .unwrap_or(false);
        if old_log {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("Failed to remove old log file {:?}: {}", path, e);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct LocalTimeTimer;

impl fmt::time::FormatTime for LocalTimeTimer {
    fn format_time(&self, w: &mut fmt::format::Writer) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_names() {
        assert!(is_log_file("vtuner-ctl.log"));
        assert!(is_log_file("vtuner-ctl.log.2026-10-18"));
        assert!(!is_log_file("other.log"));
    }

    #[test]
    fn test_clean_missing_dir_is_ok() {
        let dir = std::env::temp_dir().join("vtuner-ctl-no-such-log-dir");
        assert!(clean_old_logs(&dir, 7).is_ok());
    }
}
