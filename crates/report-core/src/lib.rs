//! Core types for the class report generator.
//!
//! Holds the record and month-key models, the two-format date parser,
//! number/date formatting helpers, the shared error type and the CLI
//! settings layer.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
