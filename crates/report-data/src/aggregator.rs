//! Per-month, per-student hour totals.

use std::collections::{BTreeMap, HashMap};

use report_core::dates::MonthKey;
use report_core::models::{RawRecord, Rejection};
use tracing::{debug, warn};

use crate::normalizer::normalize;

// ── MonthSummary ──────────────────────────────────────────────────────────────

/// Hours accumulated by one student within a month.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentHours {
    pub student: String,
    pub hours: f64,
}

/// Student totals for one month, kept in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthSummary {
    entries: Vec<StudentHours>,
    /// Student name → position in `entries`.
    index: HashMap<String, usize>,
}

impl MonthSummary {
    /// Add `hours` to `student`, starting them at zero on first sight.
    ///
    /// Returns `false` and leaves the total untouched when the sum would no
    /// longer be finite.
    fn add(&mut self, student: &str, hours: f64) -> bool {
        match self.index.get(student) {
            Some(&pos) => {
                let total = self.entries[pos].hours + hours;
                if !total.is_finite() {
                    return false;
                }
                self.entries[pos].hours = total;
            }
            None => {
                self.index.insert(student.to_string(), self.entries.len());
                self.entries.push(StudentHours {
                    student: student.to_string(),
                    hours,
                });
            }
        }
        true
    }

    /// Students and their totals, first-seen first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.student.as_str(), e.hours))
    }

    pub fn entries(&self) -> &[StudentHours] {
        &self.entries
    }

    pub fn get(&self, student: &str) -> Option<f64> {
        self.index.get(student).map(|&pos| self.entries[pos].hours)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over every student in the month.
    ///
    /// Each student's total is finite; this sum is not guarded.
    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|e| e.hours).sum()
    }
}

// ── AggregationStats ──────────────────────────────────────────────────────────

/// How many records an aggregation pass saw, kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub records_seen: usize,
    pub records_accepted: usize,
    pub rejected: BTreeMap<Rejection, usize>,
}

impl AggregationStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn rejected_for(&self, reason: Rejection) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }
}

// ── AggregationResult ─────────────────────────────────────────────────────────

/// Every month that received at least one accepted record, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    months: BTreeMap<MonthKey, MonthSummary>,
    stats: AggregationStats,
}

impl AggregationResult {
    /// Look a month up by its caller-facing label, e.g. `"May 2025"`.
    ///
    /// Labels that are not in canonical form never match.
    pub fn get(&self, label: &str) -> Option<&MonthSummary> {
        MonthKey::parse(label).and_then(|key| self.months.get(&key))
    }

    pub fn get_key(&self, key: &MonthKey) -> Option<&MonthSummary> {
        self.months.get(key)
    }

    pub fn contains(&self, key: &MonthKey) -> bool {
        self.months.contains_key(key)
    }

    /// Month keys in chronological order.
    pub fn months(&self) -> impl Iterator<Item = &MonthKey> {
        self.months.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &MonthSummary)> {
        self.months.iter()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn stats(&self) -> &AggregationStats {
        &self.stats
    }

    /// Hours summed over every month and student.
    pub fn total_hours(&self) -> f64 {
        self.months.values().map(MonthSummary::total_hours).sum()
    }
}

// ── MonthAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups attendance records by month and student.
pub struct MonthAggregator;

impl MonthAggregator {
    /// Fold `records` into per-month student totals.
    ///
    /// Records the normalizer rejects are counted and dropped; this never
    /// fails, whatever the input.
    pub fn aggregate(records: &[RawRecord]) -> AggregationResult {
        let mut result = AggregationResult::default();

        for record in records {
            result.stats.records_seen += 1;
            match normalize(record) {
                Ok(row) => {
                    let summary = result.months.entry(row.month).or_default();
                    if summary.add(&row.student, row.hours) {
                        result.stats.records_accepted += 1;
                    } else {
                        warn!(
                            "Dropping {} hours for {} in {}: total overflows",
                            row.hours, row.student, row.month
                        );
                        *result.stats.rejected.entry(Rejection::InvalidHours).or_insert(0) += 1;
                    }
                }
                Err(reason) => {
                    *result.stats.rejected.entry(reason).or_insert(0) += 1;
                }
            }
        }

        debug!(
            "Aggregated {} records: {} accepted, {} rejected, {} months",
            result.stats.records_seen,
            result.stats.records_accepted,
            result.stats.rejected_total(),
            result.months.len(),
        );

        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(student: &str, date: &str, hours: &str) -> RawRecord {
        RawRecord::new(student, date, hours)
    }

    fn scenario() -> Vec<RawRecord> {
        vec![
            rec("A", "2025-05-01", "2"),
            rec("A", "03/05/2025", "1.5"),
            rec("B", "2025-05-02", "3"),
            rec("C", "not-a-date", "1"),
        ]
    }

    // ── grouping ──────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_scenario() {
        let result = MonthAggregator::aggregate(&scenario());

        assert_eq!(result.len(), 1);
        let may = result.get("May 2025").expect("May 2025 present");
        let lines: Vec<(&str, f64)> = may.iter().collect();
        assert_eq!(lines, vec![("A", 3.5), ("B", 3.0)]);
        assert!(may.get("C").is_none());
    }

    #[test]
    fn test_aggregate_groups_by_month() {
        let records = vec![
            rec("A", "2025-05-01", "1"),
            rec("A", "2025-06-01", "2"),
            rec("B", "15/06/2025", "4"),
        ];
        let result = MonthAggregator::aggregate(&records);

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("May 2025").unwrap().get("A"), Some(1.0));
        let june = result.get("June 2025").unwrap();
        assert_eq!(june.get("A"), Some(2.0));
        assert_eq!(june.get("B"), Some(4.0));
    }

    #[test]
    fn test_aggregate_first_seen_order() {
        let records = vec![
            rec("Zoe", "2025-05-03", "1"),
            rec("Adam", "2025-05-01", "1"),
            rec("Zoe", "2025-05-04", "1"),
            rec("Mia", "2025-05-02", "1"),
        ];
        let result = MonthAggregator::aggregate(&records);

        let names: Vec<&str> = result
            .get("May 2025")
            .unwrap()
            .iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(names, vec!["Zoe", "Adam", "Mia"]);
    }

    #[test]
    fn test_aggregate_months_chronological() {
        let records = vec![
            rec("A", "2026-01-10", "1"),
            rec("A", "2025-04-10", "1"),
            rec("A", "2025-12-10", "1"),
        ];
        let result = MonthAggregator::aggregate(&records);

        let keys: Vec<String> = result.months().map(|m| m.to_string()).collect();
        assert_eq!(keys, vec!["April 2025", "December 2025", "January 2026"]);
    }

    #[test]
    fn test_aggregate_duplicate_rows_both_counted() {
        let records = vec![rec("A", "2025-05-01", "1"), rec("A", "2025-05-01", "1")];
        let result = MonthAggregator::aggregate(&records);
        assert_eq!(result.get("May 2025").unwrap().get("A"), Some(2.0));
    }

    // ── robustness ────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_empty_input() {
        let result = MonthAggregator::aggregate(&[]);
        assert!(result.is_empty());
        assert_eq!(result.stats().records_seen, 0);
        assert_eq!(result.total_hours(), 0.0);
    }

    #[test]
    fn test_aggregate_all_malformed() {
        let records = vec![
            RawRecord::default(),
            rec("A", "2025/05/17", "1"),
            rec("B", "2025-05-01", "lots"),
            rec("", "2025-05-01", "1"),
        ];
        let result = MonthAggregator::aggregate(&records);

        assert!(result.is_empty());
        let stats = result.stats();
        assert_eq!(stats.records_seen, 4);
        assert_eq!(stats.records_accepted, 0);
        assert_eq!(stats.rejected_total(), 4);
        assert_eq!(stats.rejected_for(Rejection::MissingStudent), 2);
        assert_eq!(stats.rejected_for(Rejection::InvalidDate), 1);
        assert_eq!(stats.rejected_for(Rejection::InvalidHours), 1);
        assert_eq!(stats.rejected_for(Rejection::MissingDate), 0);
    }

    #[test]
    fn test_aggregate_conserves_accepted_hours() {
        let records = vec![
            rec("A", "2025-05-01", "2"),
            rec("B", "14/06/2025", "0.25"),
            rec("C", "2025-07-31", "1.75"),
            rec("D", "bad", "100"),
            rec("E", "2025-07-01", "-3"),
            rec("A", "01/07/2025", "4.5"),
        ];
        let result = MonthAggregator::aggregate(&records);

        let expected: f64 = records
            .iter()
            .filter_map(|r| normalize(r).ok())
            .map(|row| row.hours)
            .sum();
        assert!((result.total_hours() - expected).abs() < 1e-9);
        assert!((expected - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_overflowing_total_rejected() {
        let records = vec![
            rec("A", "2025-05-01", "1e308"),
            rec("A", "2025-05-02", "1e308"),
            rec("A", "2025-05-03", "2"),
        ];
        let result = MonthAggregator::aggregate(&records);

        let may = result.get("May 2025").unwrap();
        let hours = may.get("A").unwrap();
        assert!(hours.is_finite());
        assert!((hours - (1e308 + 2.0)).abs() < 1e292);
        assert_eq!(result.stats().records_accepted, 2);
        assert_eq!(result.stats().rejected_for(Rejection::InvalidHours), 1);
    }

    #[test]
    fn test_aggregate_idempotent() {
        let records = scenario();
        assert_eq!(
            MonthAggregator::aggregate(&records),
            MonthAggregator::aggregate(&records)
        );
    }

    #[test]
    fn test_aggregate_get_requires_canonical_label() {
        let result = MonthAggregator::aggregate(&scenario());
        assert!(result.get("May 2025").is_some());
        assert!(result.get("may 2025").is_none());
        assert!(result.get("2025-05").is_none());
        assert!(result.get("June 2025").is_none());
    }
}
