//! Document sinks: turn a month's totals into a file-ready artifact.

use report_core::dates::MonthKey;
use report_core::error::{ReportError, Result};
use report_core::formatting::{
    align_right, center, format_hours, report_filename, round_hours,
};
use serde::Serialize;

/// Default page width of text reports, in characters.
pub const DEFAULT_PAGE_WIDTH: usize = 72;

// ── Request / artifact ────────────────────────────────────────────────────────

/// One labelled number on a report, e.g. a student and their hours.
///
/// Requests built by the pipeline carry values rounded to one decimal place.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub label: String,
    pub value: f64,
}

/// Everything a sink needs to lay out one month's report.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub month: MonthKey,
    pub title: String,
    pub lines: Vec<ReportLine>,
    /// Human-readable generation date, e.g. `"19 October 2026"`.
    pub generated_at: String,
}

/// A rendered report ready to be saved or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub month: MonthKey,
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ── DocumentSink ──────────────────────────────────────────────────────────────

/// Renders a [`DocumentRequest`] into a concrete document format.
pub trait DocumentSink {
    /// File extension of the produced artifacts, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, request: &DocumentRequest) -> Result<RenderedDocument>;
}

/// Pick a sink by its CLI name (`"text"` or `"json"`).
pub fn sink_for_format(format: &str) -> Result<Box<dyn DocumentSink>> {
    match format {
        "text" => Ok(Box::new(TextDocumentSink::default())),
        "json" => Ok(Box::new(JsonDocumentSink)),
        other => Err(ReportError::Config(format!(
            "unknown report format \"{}\"",
            other
        ))),
    }
}

// ── TextDocumentSink ──────────────────────────────────────────────────────────

/// Plain-text page: centred title, one `"<student>: <hours> hours"` line per
/// student, right-aligned generation stamp.
#[derive(Debug, Clone)]
pub struct TextDocumentSink {
    page_width: usize,
}

impl TextDocumentSink {
    pub fn with_page_width(page_width: usize) -> Self {
        Self { page_width }
    }
}

impl Default for TextDocumentSink {
    fn default() -> Self {
        Self::with_page_width(DEFAULT_PAGE_WIDTH)
    }
}

impl DocumentSink for TextDocumentSink {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, request: &DocumentRequest) -> Result<RenderedDocument> {
        let mut out = String::new();
        out.push_str(&center(&request.title, self.page_width));
        out.push_str("\n\n");

        for line in &request.lines {
            out.push_str(&format!("{}: {} hours\n", line.label, format_hours(line.value)));
        }

        out.push('\n');
        out.push_str(&align_right(
            &format!("Report generated on {}", request.generated_at),
            self.page_width,
        ));
        out.push('\n');

        Ok(RenderedDocument {
            month: request.month,
            filename: report_filename(&request.month, self.extension()),
            bytes: out.into_bytes(),
        })
    }
}

// ── JsonDocumentSink ──────────────────────────────────────────────────────────

/// Pretty-printed JSON for downstream tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentSink;

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    month: String,
    lines: Vec<JsonLine<'a>>,
    generated_at: &'a str,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    student: &'a str,
    hours: f64,
}

impl DocumentSink for JsonDocumentSink {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, request: &DocumentRequest) -> Result<RenderedDocument> {
        let report = JsonReport {
            title: &request.title,
            month: request.month.to_string(),
            lines: request
                .lines
                .iter()
                .map(|l| JsonLine {
                    student: &l.label,
                    hours: round_hours(l.value),
                })
                .collect(),
            generated_at: &request.generated_at,
        };

        let bytes = serde_json::to_vec_pretty(&report).map_err(|e| ReportError::Render {
            month: request.month.to_string(),
            reason: e.to_string(),
        })?;

        Ok(RenderedDocument {
            month: request.month,
            filename: report_filename(&request.month, self.extension()),
            bytes,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
