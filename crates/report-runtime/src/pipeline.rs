//! End-to-end report generation for one request.
//!
//! [`ReportPipeline::run`] fetches every row from a [`RecordSource`],
//! aggregates them, and renders one document per requested month through a
//! [`DocumentSink`]. A source failure stops the run before aggregation; a
//! requested month without data only yields a [`MonthOutcome::NoData`]
//! notice. Each run builds and drops its own aggregation, so a pipeline can
//! be reused across requests without sharing state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use report_core::dates::MonthKey;
use report_core::error::Result;
use report_core::formatting::{format_generated_on, report_title, round_hours};
use report_core::models::RawRecord;
use report_data::aggregator::{AggregationStats, MonthAggregator, MonthSummary};
use report_data::months::month_options;
use report_data::reader::RecordSource;
use tracing::{debug, info};

use crate::sink::{DocumentRequest, DocumentSink, RenderedDocument, ReportLine};

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// What happened to one requested month.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthOutcome {
    Generated(RenderedDocument),
    /// The month had no accepted rows (or is not a valid month label).
    NoData { month: String },
}

/// The result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    /// Months the source covers, oldest first.
    pub month_options: Vec<MonthKey>,
    /// Row counters from the aggregation pass.
    pub stats: AggregationStats,
    /// One entry per distinct requested month, in request order.
    pub outcomes: Vec<MonthOutcome>,
}

impl ReportRun {
    pub fn documents(&self) -> impl Iterator<Item = &RenderedDocument> {
        self.outcomes.iter().filter_map(|o| match o {
            MonthOutcome::Generated(doc) => Some(doc),
            MonthOutcome::NoData { .. } => None,
        })
    }

    /// Requested months that produced no document.
    pub fn missing_months(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                MonthOutcome::NoData { month } => Some(month.as_str()),
                MonthOutcome::Generated(_) => None,
            })
            .collect()
    }

    /// Save every generated document into `dir`, creating it if needed.
    ///
    /// Returns the written paths in outcome order.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for doc in self.documents() {
            let path = dir.join(&doc.filename);
            std::fs::write(&path, &doc.bytes)?;
            info!("{} created", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

// ── ReportPipeline ────────────────────────────────────────────────────────────

/// Turns attendance rows into per-month documents.
pub struct ReportPipeline<'a> {
    sink: &'a dyn DocumentSink,
    generated_on: NaiveDate,
}

impl<'a> ReportPipeline<'a> {
    /// `generated_on` is stamped on every document of the run.
    pub fn new(sink: &'a dyn DocumentSink, generated_on: NaiveDate) -> Self {
        Self { sink, generated_on }
    }

    /// Fetch from `source` and report on `requested` months.
    ///
    /// Fails only when the source cannot be read or the sink fails.
    pub fn run(&self, source: &dyn RecordSource, requested: &[String]) -> Result<ReportRun> {
        let records = source.fetch()?;
        info!("Loaded {} rows from {}", records.len(), source.name());
        self.run_records(&records, requested)
    }

    /// Same as [`run`](Self::run) on rows that are already in memory.
    pub fn run_records(&self, records: &[RawRecord], requested: &[String]) -> Result<ReportRun> {
        let options = month_options(records);
        let summary = MonthAggregator::aggregate(records);
        let stats = summary.stats().clone();

        if stats.rejected_total() > 0 {
            info!(
                "Discarded {} of {} rows",
                stats.rejected_total(),
                stats.records_seen
            );
            for (reason, count) in &stats.rejected {
                debug!("  {}: {}", reason, count);
            }
        }

        let generated_at = format_generated_on(self.generated_on);
        let mut seen = HashSet::new();
        let mut outcomes = Vec::new();

        for label in requested.iter().map(|m| m.trim()) {
            if !seen.insert(label) {
                continue;
            }

            let found = MonthKey::parse(label)
                .and_then(|key| summary.get_key(&key).map(|s| (key, s)));

            match found {
                Some((key, month_summary)) => {
                    let request = build_request(key, month_summary, &generated_at);
                    let doc = self.sink.render(&request)?;
                    debug!("Rendered {} ({} bytes)", doc.filename, doc.bytes.len());
                    outcomes.push(MonthOutcome::Generated(doc));
                }
                None => {
                    info!("No data found for {}", label);
                    outcomes.push(MonthOutcome::NoData {
                        month: label.to_string(),
                    });
                }
            }
        }

        Ok(ReportRun {
            month_options: options,
            stats,
            outcomes,
        })
    }
}

/// Months available in `source`, for offering a selection.
pub fn available_months(source: &dyn RecordSource) -> Result<Vec<MonthKey>> {
    let records = source.fetch()?;
    Ok(month_options(&records))
}

/// The sink input for one month: titled, students in first-seen order, hours
/// already rounded to one decimal place.
pub fn build_request(month: MonthKey, summary: &MonthSummary, generated_at: &str) -> DocumentRequest {
    DocumentRequest {
        month,
        title: report_title(&month),
        lines: summary
            .iter()
            .map(|(student, hours)| ReportLine {
                label: student.to_string(),
                value: round_hours(hours),
            })
            .collect(),
        generated_at: generated_at.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
