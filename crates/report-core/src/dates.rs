use std::fmt;

use chrono::{Datelike, NaiveDate};

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Accepted attendance date layouts, tried in order.
///
/// ISO comes first because it cannot be confused with anything else; the
/// day/month/year layout is the fallback. Nothing else is accepted.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Layout used to render a [`MonthKey`], e.g. `"May 2025"`.
const MONTH_KEY_FORMAT: &str = "%B %Y";

/// Parse a raw spreadsheet date using [`DATE_FORMATS`].
///
/// Surrounding whitespace is ignored. Returns `None` for empty input or when
/// no layout matches the whole string. The year must be written with exactly
/// four digits: `"17/05/25"` and `"+2025-05-17"` are rejected.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .filter(|_| has_four_digit_year(s, fmt))
    })
}

/// chrono's `%Y` takes any digit count and an optional sign, so the year
/// field is checked separately.
fn has_four_digit_year(s: &str, fmt: &str) -> bool {
    let field = if fmt.starts_with("%Y") {
        s.split(['-', '/']).next()
    } else {
        s.rsplit(['-', '/']).next()
    };
    matches!(field, Some(year) if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
}

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// One reporting period, displayed as `"<FullMonthName> <Year>"`.
///
/// Internally the first day of the month, so ordering is chronological rather
/// than lexicographic. Month names are chrono's fixed English names and do not
/// depend on the process locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// The month that contains `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey(date.with_day(1).unwrap_or(date))
    }

    /// Parse a raw spreadsheet date straight into its month.
    pub fn from_raw_date(raw: &str) -> Option<Self> {
        parse_date(raw).map(Self::from_date)
    }

    /// Match a caller-supplied month label against the canonical form.
    ///
    /// The label must round-trip exactly: `"May 2025"` parses, while
    /// `"may 2025"`, `"May  2025"` or `"2025-05"` do not.
    pub fn parse(label: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(&format!("01 {label}"), "%d %B %Y").ok()?;
        let key = Self::from_date(date);
        (key.to_string() == label).then_some(key)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Calendar month number, 1–12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Label with spaces replaced by underscores, for file names.
    pub fn slug(&self) -> String {
        self.to_string().replace(' ', "_")
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(MONTH_KEY_FORMAT))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
