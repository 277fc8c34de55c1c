//! Attendance sources: spreadsheet exports on disk.
//!
//! A sheet reaches us either as a CSV export with a header row or as a JSON
//! array of row objects (the "all records" dump of a sheet). Both are bound to
//! [`RawRecord`] fields through a [`ColumnBinding`]. Any failure to read the
//! source as a whole is fatal and reported as
//! [`ReportError::SourceUnavailable`]; individual odd cells are passed through
//! and left for the normalizer to reject.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use report_core::error::{ReportError, Result};
use report_core::models::{ColumnBinding, RawRecord};
use serde_json::Value;
use tracing::{debug, warn};

/// Extensions recognised as attendance exports.
pub const EXPORT_EXTENSIONS: &[&str] = &["csv", "json"];

// ── RecordSource ──────────────────────────────────────────────────────────────

/// Anything that can hand over the full, ordered list of attendance rows.
pub trait RecordSource {
    /// Human-readable description for log lines.
    fn name(&self) -> String;

    /// Read every row. An error means no rows can be trusted.
    fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// Build the right source for `path`: a directory of exports, a `.csv` file
/// or a `.json` file.
pub fn open_source(path: &Path, binding: ColumnBinding) -> Result<Box<dyn RecordSource>> {
    if !path.exists() {
        return Err(ReportError::source_unavailable(path, "path does not exist"));
    }

    if path.is_dir() {
        return Ok(Box::new(ExportDirectory::new(path, binding)));
    }

    match export_extension(path).as_deref() {
        Some("csv") => Ok(Box::new(CsvExport::new(path, binding))),
        Some("json") => Ok(Box::new(JsonExport::new(path, binding))),
        _ => Err(ReportError::source_unavailable(
            path,
            "unsupported export type (expected .csv or .json)",
        )),
    }
}

/// Find all `.csv` / `.json` exports recursively under `dir`, sorted by path.
pub fn find_export_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Export directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && export_extension(entry.path()).is_some())
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Lower-cased extension of `path` when it is a recognised export type.
fn export_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXPORT_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| ReportError::source_unavailable(path, e))
}

// ── CsvExport ─────────────────────────────────────────────────────────────────

/// A CSV export whose first row names the columns.
pub struct CsvExport {
    path: PathBuf,
    binding: ColumnBinding,
}

impl CsvExport {
    pub fn new(path: impl Into<PathBuf>, binding: ColumnBinding) -> Self {
        Self {
            path: path.into(),
            binding,
        }
    }

    /// Parse CSV text from any reader; `origin` is used in errors and logs.
    pub fn read_from<R: Read>(
        reader: R,
        binding: &ColumnBinding,
        origin: &Path,
    ) -> Result<Vec<RawRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ReportError::source_unavailable(origin, e))?
            .clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ReportError::source_unavailable(origin, "missing header row"));
        }

        let [student_col, date_col, hours_col] =
            binding.columns().map(|name| column_index(&headers, name, origin));

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in rdr.records().enumerate() {
            let row = match row {
                Ok(r) => r,
                Err(e) if e.is_io_error() => {
                    return Err(ReportError::source_unavailable(origin, e));
                }
                Err(e) => {
                    debug!("Skipping undecodable row {} in {}: {}", line + 2, origin.display(), e);
                    skipped += 1;
                    continue;
                }
            };

            let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::to_string);
            records.push(RawRecord {
                student: cell(student_col),
                date: cell(date_col),
                hours: cell(hours_col),
            });
        }

        debug!(
            "CSV {}: {} rows read, {} undecodable",
            origin.display(),
            records.len(),
            skipped
        );

        Ok(records)
    }
}

impl RecordSource for CsvExport {
    fn name(&self) -> String {
        format!("CSV export {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawRecord>> {
        let reader = open_file(&self.path)?;
        Self::read_from(reader, &self.binding, &self.path)
    }
}

/// Position of the `name` column, tolerating surrounding spaces and a BOM.
fn column_index(headers: &csv::StringRecord, name: &str, origin: &Path) -> Option<usize> {
    let idx = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name);
    if idx.is_none() {
        warn!("Column \"{}\" not found in {}", name, origin.display());
    }
    idx
}

// ── JsonExport ────────────────────────────────────────────────────────────────

/// A JSON array of objects, one per sheet row, keyed by column name.
pub struct JsonExport {
    path: PathBuf,
    binding: ColumnBinding,
}

impl JsonExport {
    pub fn new(path: impl Into<PathBuf>, binding: ColumnBinding) -> Self {
        Self {
            path: path.into(),
            binding,
        }
    }

    /// Parse a JSON document from any reader; `origin` is used in errors.
    pub fn read_from<R: Read>(
        reader: R,
        binding: &ColumnBinding,
        origin: &Path,
    ) -> Result<Vec<RawRecord>> {
        let doc: Value = serde_json::from_reader(reader)
            .map_err(|e| ReportError::source_unavailable(origin, e))?;

        let Value::Array(rows) = doc else {
            return Err(ReportError::source_unavailable(
                origin,
                "expected a JSON array of row objects",
            ));
        };

        let records: Vec<RawRecord> = rows
            .iter()
            .map(|row| RawRecord {
                student: json_cell(row, &binding.student),
                date: json_cell(row, &binding.date),
                hours: json_cell(row, &binding.hours),
            })
            .collect();

        debug!("JSON {}: {} rows read", origin.display(), records.len());
        Ok(records)
    }
}

impl RecordSource for JsonExport {
    fn name(&self) -> String {
        format!("JSON export {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawRecord>> {
        let reader = open_file(&self.path)?;
        Self::read_from(reader, &self.binding, &self.path)
    }
}

/// Text of one cell. Sheets export numeric cells as JSON numbers, so those are
/// rendered back to text; anything that is not a string or number is absent.
fn json_cell(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── ExportDirectory ───────────────────────────────────────────────────────────

/// Every export under a directory, concatenated in path order.
pub struct ExportDirectory {
    dir: PathBuf,
    binding: ColumnBinding,
}

impl ExportDirectory {
    pub fn new(dir: impl Into<PathBuf>, binding: ColumnBinding) -> Self {
        Self {
            dir: dir.into(),
            binding,
        }
    }
}

impl RecordSource for ExportDirectory {
    fn name(&self) -> String {
        format!("export directory {}", self.dir.display())
    }

    fn fetch(&self) -> Result<Vec<RawRecord>> {
        let files = find_export_files(&self.dir);
        if files.is_empty() {
            return Err(ReportError::source_unavailable(
                &self.dir,
                "no .csv or .json exports found",
            ));
        }

        let mut all = Vec::new();
        for file in &files {
            let source = open_source(file, self.binding.clone())?;
            all.extend(source.fetch()?);
        }

        debug!(
            "Read {} rows from {} exports under {}",
            all.len(),
            files.len(),
            self.dir.display()
        );
        Ok(all)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
