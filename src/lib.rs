//! # sheetgrade
//!
//! Grades free-text quiz answers stored in a spreadsheet by asking a language
//! model to compare each answer with its canonical answer, then writes
//! per-question feedback and a total grade back to the sheet.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Questions and their canonical answers
pub mod answer_key;
/// Environment-driven configuration
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// The grading loop and its results
pub mod grade;
/// Common-mistake hints mined from historical notes
pub mod mining;
/// The remote scoring oracle
pub mod oracle;
/// End-of-run summary and CSV export
pub mod report;
/// Run context wiring every component together
pub mod session;
/// Spreadsheet backends
pub mod sheet;

pub use answer_key::{AnswerKey, Question};
pub use config::{ConfigError, GraderConfig, OracleEnv, SheetSource};
pub use grade::{GradeRecord, GradingLoop, MistakeTally};
pub use oracle::{Judgment, OracleError, ScoringOracle, Verdict};
pub use session::{GradingSession, RunSummary, grade_sheet};
pub use sheet::{OutputColumns, SheetError, SheetSnapshot, SheetStore, StudentRow};
