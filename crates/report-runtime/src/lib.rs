//! Report generation layer.
//!
//! Drives one request end to end: fetch the attendance rows, aggregate them,
//! and hand each requested month to a document sink.

pub mod pipeline;
pub mod sink;

pub use report_core as core;
pub use report_data as data;
