//! Row validation: one [`RawRecord`] in, a [`NormalizedRow`] or a
//! [`Rejection`] out.

use report_core::dates::MonthKey;
use report_core::models::{NormalizedRow, RawRecord, Rejection};

/// Validate `record` and resolve its month.
///
/// Checks run in a fixed order: all three fields must be present, then the
/// hours must be a finite non-negative number, then the date must match one
/// of [`report_core::dates::DATE_FORMATS`]. The first failing check decides
/// the [`Rejection`].
pub fn normalize(record: &RawRecord) -> Result<NormalizedRow, Rejection> {
    let student = present(&record.student).ok_or(Rejection::MissingStudent)?;
    let raw_date = present(&record.date).ok_or(Rejection::MissingDate)?;
    let raw_hours = present(&record.hours).ok_or(Rejection::MissingHours)?;

    let hours = parse_hours(raw_hours).ok_or(Rejection::InvalidHours)?;
    let month = MonthKey::from_raw_date(raw_date).ok_or(Rejection::InvalidDate)?;

    Ok(NormalizedRow {
        student: student.to_string(),
        month,
        hours,
    })
}

/// The trimmed field value, or `None` when absent or blank.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_hours(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|h| h.is_finite() && *h >= 0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
