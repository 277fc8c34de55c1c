use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dates::MonthKey;

/// Column header of the student name in the attendance sheet.
pub const DEFAULT_STUDENT_COLUMN: &str = "Class registration";
/// Column header of the lesson date in the attendance sheet.
pub const DEFAULT_DATE_COLUMN: &str = "Date";
/// Column header of the lesson length. The spelling matches the sheet.
pub const DEFAULT_HOURS_COLUMN: &str = "Class lenght time in hour";

/// One attendance row exactly as the source delivered it.
///
/// Every field is optional text; nothing is validated at this stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub student: Option<String>,
    pub date: Option<String>,
    pub hours: Option<String>,
}

impl RawRecord {
    /// Build a record from three present string fields.
    pub fn new(student: &str, date: &str, hours: &str) -> Self {
        Self {
            student: Some(student.to_string()),
            date: Some(date.to_string()),
            hours: Some(hours.to_string()),
        }
    }
}

/// A record that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub student: String,
    pub month: MonthKey,
    pub hours: f64,
}

/// Why a [`RawRecord`] was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    MissingStudent,
    MissingDate,
    MissingHours,
    /// Hours were not a finite, non-negative number.
    InvalidHours,
    /// Date matched none of the accepted layouts.
    InvalidDate,
}

impl Rejection {
    pub const ALL: [Rejection; 5] = [
        Rejection::MissingStudent,
        Rejection::MissingDate,
        Rejection::MissingHours,
        Rejection::InvalidHours,
        Rejection::InvalidDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingStudent => "missing_student",
            Rejection::MissingDate => "missing_date",
            Rejection::MissingHours => "missing_hours",
            Rejection::InvalidHours => "invalid_hours",
            Rejection::InvalidDate => "invalid_date",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which source columns feed the three [`RawRecord`] fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub student: String,
    pub date: String,
    pub hours: String,
}

impl Default for ColumnBinding {
    fn default() -> Self {
        Self {
            student: DEFAULT_STUDENT_COLUMN.to_string(),
            date: DEFAULT_DATE_COLUMN.to_string(),
            hours: DEFAULT_HOURS_COLUMN.to_string(),
        }
    }
}

impl ColumnBinding {
    /// The three column names in `student`, `date`, `hours` order.
    pub fn columns(&self) -> [&str; 3] {
        [self.student.as_str(), self.date.as_str(), self.hours.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_new_fills_all_fields() {
        let rec = RawRecord::new("Ana", "2025-05-01", "2");
        assert_eq!(rec.student.as_deref(), Some("Ana"));
        assert_eq!(rec.date.as_deref(), Some("2025-05-01"));
        assert_eq!(rec.hours.as_deref(), Some("2"));
    }

    #[test]
    fn test_raw_record_deserialize_missing_fields() {
        let rec: RawRecord = serde_json::from_str(r#"{"student": "Ana"}"#).unwrap();
        assert_eq!(rec.student.as_deref(), Some("Ana"));
        assert!(rec.date.is_none());
        assert!(rec.hours.is_none());
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(Rejection::InvalidDate.to_string(), "invalid_date");
        assert_eq!(Rejection::MissingStudent.to_string(), "missing_student");
    }

    #[test]
    fn test_column_binding_default_matches_sheet() {
        let binding = ColumnBinding::default();
        assert_eq!(
            binding.columns(),
            ["Class registration", "Date", "Class lenght time in hour"]
        );
    }
}
