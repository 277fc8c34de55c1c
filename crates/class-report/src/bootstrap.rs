use std::path::{Path, PathBuf};
use std::sync::Mutex;

use report_core::settings::APP_DIR_NAME;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Export picked up from the working directory when nothing else is found.
const LOCAL_EXPORT_NAME: &str = "attendance.csv";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the standard `~/.class-report/` directory hierarchy exists.
///
/// Creates `~/.class-report/`, `~/.class-report/logs/` and
/// `~/.class-report/data/` if absent.
pub fn ensure_directories() -> anyhow::Result<()> {
    let app_dir = app_dir();
    std::fs::create_dir_all(app_dir.join("logs"))?;
    std::fs::create_dir_all(app_dir.join("data"))?;
    Ok(())
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name onto a `tracing` filter directive.
///
/// Unknown names are passed through so `RUST_LOG`-style directives also work.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to `log_file` (appended, no colours) when given, otherwise to
/// stderr. Falls back to `"info"` if the level is not recognised.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate an attendance source when `--source` was not given.
///
/// Checks, in order:
/// 1. `~/.class-report/data/` when it holds at least one export
/// 2. `./attendance.csv`
pub fn discover_data_path() -> Option<PathBuf> {
    discover_data_path_in(&app_dir().join("data"), Path::new("."))
}

fn discover_data_path_in(data_dir: &Path, work_dir: &Path) -> Option<PathBuf> {
    if !report_data::reader::find_export_files(data_dir).is_empty() {
        return Some(data_dir.to_path_buf());
    }
    let local = work_dir.join(LOCAL_EXPORT_NAME);
    local.is_file().then_some(local)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
