//! Discovery of the months a set of records covers.

use std::collections::BTreeSet;

use report_core::dates::MonthKey;
use report_core::models::RawRecord;

/// Distinct months of every parseable record date, oldest first.
///
/// Only the date is inspected, with the same parser the normalizer uses, so
/// a month whose rows all fail on other fields is still listed here while
/// having no summary after aggregation.
pub fn month_options(records: &[RawRecord]) -> Vec<MonthKey> {
    records
        .iter()
        .filter_map(|r| r.date.as_deref())
        .filter_map(MonthKey::from_raw_date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// [`month_options`] rendered as caller-facing labels.
pub fn month_labels(records: &[RawRecord]) -> Vec<String> {
    month_options(records)
        .iter()
        .map(MonthKey::to_string)
        .collect()
}
