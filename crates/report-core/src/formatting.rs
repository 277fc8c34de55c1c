use chrono::NaiveDate;

use crate::dates::MonthKey;

/// Layout of the "generated on" stamp, e.g. `"19 October 2026"`.
pub const GENERATED_ON_FORMAT: &str = "%d %B %Y";

/// Format an hour total with exactly one decimal place.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_hours;
///
/// assert_eq!(format_hours(3.5), "3.5");
/// assert_eq!(format_hours(3.0), "3.0");
/// assert_eq!(format_hours(0.0), "0.0");
/// ```
pub fn format_hours(hours: f64) -> String {
    format!("{:.1}", hours)
}

/// Round an hour total to one decimal place, for machine-readable output.
///
/// # Examples
///
/// ```
/// use report_core::formatting::round_hours;
///
/// assert!((round_hours(3.46) - 3.5).abs() < 1e-9);
/// assert!((round_hours(2.0) - 2.0).abs() < 1e-9);
/// ```
pub fn round_hours(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

/// The human-readable generation date stamped on each report.
pub fn format_generated_on(date: NaiveDate) -> String {
    date.format(GENERATED_ON_FORMAT).to_string()
}

/// Report heading for `month`, e.g. `"Class Hours - May 2025"`.
pub fn report_title(month: &MonthKey) -> String {
    format!("Class Hours - {}", month)
}

/// Artifact file name for `month`, e.g. `"report_May_2025.txt"`.
pub fn report_filename(month: &MonthKey, extension: &str) -> String {
    format!("report_{}.{}", month.slug(), extension)
}

/// Pad `text` on both sides so it sits in the middle of `width` columns.
///
/// Text wider than `width` is returned unchanged.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    format!("{}{}", " ".repeat(left), text)
}

/// Left-pad `text` so it ends at column `width`.
pub fn align_right(text: &str, width: usize) -> String {
    format!("{:>width$}", text, width = width)
}
