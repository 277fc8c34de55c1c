use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{
    ColumnBinding, DEFAULT_DATE_COLUMN, DEFAULT_HOURS_COLUMN, DEFAULT_STUDENT_COLUMN,
};

/// Directory under `$HOME` that holds logs, data and persisted settings.
pub const APP_DIR_NAME: &str = ".class-report";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly class-hour reports from attendance spreadsheet exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "class-report",
    about = "Monthly class-hour reports from attendance spreadsheet exports",
    version
)]
pub struct Settings {
    /// Attendance export: a .csv or .json file, or a directory of exports
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Month to report on, e.g. "May 2025" (repeatable)
    #[arg(long = "month", value_name = "MONTH")]
    pub months: Vec<String>,

    /// Report on every month found in the source
    #[arg(long)]
    pub all_months: bool,

    /// Print the months available in the source and exit
    #[arg(long)]
    pub list_months: bool,

    /// Directory the reports are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Report document format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Column holding the student name
    #[arg(long, default_value = DEFAULT_STUDENT_COLUMN)]
    pub student_column: String,

    /// Column holding the lesson date
    #[arg(long, default_value = DEFAULT_DATE_COLUMN)]
    pub date_column: String,

    /// Column holding the lesson length in hours
    #[arg(long, default_value = DEFAULT_HOURS_COLUMN)]
    pub hours_column: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.class-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_column: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR_NAME).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return settings;
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; month selection is never persisted.
        if settings.source.is_none() {
            settings.source = last.source;
        }
        if !is_arg_explicitly_set(&matches, "output_dir") {
            if let Some(v) = last.output_dir {
                settings.output_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "student_column") {
            if let Some(v) = last.student_column {
                settings.student_column = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "date_column") {
            if let Some(v) = last.date_column {
                settings.date_column = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "hours_column") {
            if let Some(v) = last.hours_column {
                settings.hours_column = v;
            }
        }

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not persist settings: {}", e);
        }

        settings
    }

    /// The source column names to bind record fields to.
    pub fn column_binding(&self) -> ColumnBinding {
        ColumnBinding {
            student: self.student_column.clone(),
            date: self.date_column.clone(),
            hours: self.hours_column.clone(),
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            source: s.source.clone(),
            output_dir: Some(s.output_dir.clone()),
            format: Some(s.format.clone()),
            student_column: Some(s.student_column.clone()),
            date_column: Some(s.date_column.clone()),
            hours_column: Some(s.hours_column.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| std::ffi::OsString::from(*s)).collect()
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            source: Some(PathBuf::from("/data/attendance.csv")),
            output_dir: Some(PathBuf::from("/reports")),
            format: Some("json".to_string()),
            student_column: Some("Student".to_string()),
            date_column: Some("Day".to_string()),
            hours_column: Some("Hours".to_string()),
        };

        params.save_to(&path).expect("save");
        let loaded = LastUsedParams::load_from(&path);

        assert_eq!(loaded, params);
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        LastUsedParams {
            format: Some("text".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());
    }

    // ── Settings parsing ──────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["class-report"]);

        assert!(settings.source.is_none());
        assert!(settings.months.is_empty());
        assert!(!settings.all_months);
        assert!(!settings.list_months);
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.format, "text");
        assert_eq!(settings.column_binding(), ColumnBinding::default());
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_repeated_months() {
        let settings = Settings::parse_from([
            "class-report",
            "--month",
            "May 2025",
            "--month",
            "June 2025",
        ]);
        assert_eq!(settings.months, vec!["May 2025", "June 2025"]);
    }

    #[test]
    fn test_settings_custom_columns() {
        let settings = Settings::parse_from([
            "class-report",
            "--student-column",
            "Name",
            "--hours-column",
            "Length",
        ]);
        let binding = settings.column_binding();
        assert_eq!(binding.student, "Name");
        assert_eq!(binding.date, "Date");
        assert_eq!(binding.hours, "Length");
    }

    #[test]
    fn test_settings_rejects_unknown_format() {
        let result = Settings::try_parse_from(["class-report", "--format", "pdf"]);
        assert!(result.is_err());
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            source: Some(PathBuf::from("/data/sheet.csv")),
            format: Some("json".to_string()),
            hours_column: Some("Hours".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&["class-report"]), &config_path);

        assert_eq!(settings.source, Some(PathBuf::from("/data/sheet.csv")));
        assert_eq!(settings.format, "json");
        assert_eq!(settings.hours_column, "Hours");
        assert_eq!(settings.student_column, DEFAULT_STUDENT_COLUMN);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            source: Some(PathBuf::from("/data/old.csv")),
            format: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["class-report", "--source", "/data/new.csv", "--format", "text"]),
            &config_path,
        );

        assert_eq!(settings.source, Some(PathBuf::from("/data/new.csv")));
        assert_eq!(settings.format, "text");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            args(&["class-report", "--date-column", "Lesson date"]),
            &config_path,
        );

        assert!(config_path.exists(), "config file must be persisted after run");
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.date_column, Some("Lesson date".to_string()));
    }

    #[test]
    fn test_load_with_last_used_months_not_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            args(&["class-report", "--month", "May 2025"]),
            &config_path,
        );
        let settings = Settings::load_with_last_used_impl(args(&["class-report"]), &config_path);

        assert!(settings.months.is_empty());
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["class-report", "--clear"]),
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
        assert_eq!(settings.format, "text");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            args(&["class-report", "--debug"]),
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }
}
