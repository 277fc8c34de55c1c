//! Data layer for the class report generator.
//!
//! Reads attendance rows from spreadsheet exports, validates each row,
//! folds accepted rows into per-month student totals and discovers which
//! months a source covers.

pub mod aggregator;
pub mod months;
pub mod normalizer;
pub mod reader;

pub use report_core as core;
