#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The spreadsheet that holds student answers and receives grades.
//!
//! Row 0 of every store is the header; student rows follow. Rows and columns
//! are addressed 0-based throughout, backends translate to their own notation.

/// Service-account and static bearer tokens for the Sheets API.
pub mod auth;
/// Google Sheets v4 REST backend.
pub mod google;
/// Local CSV file backend.
pub mod local;
/// In-memory grid backend.
pub mod memory;

use async_trait::async_trait;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, StaticToken, TokenSource};
pub use google::GoogleSheet;
pub use local::CsvSheet;
pub use memory::MemorySheet;

use crate::constants::{FEEDBACK_COLUMN, GRADE_COLUMN};

/// Failures talking to a sheet backend.
#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    /// The HTTP request could not be completed.
    #[error("sheet request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with an error status.
    #[error("sheet API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body:   String,
    },
    /// Service-account authentication failed.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The backing file could not be read or written.
    #[error("sheet file error: {0}")]
    Io(#[from] std::io::Error),
    /// The backing CSV file is malformed.
    #[error("sheet CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// A response did not have the expected shape.
    #[error("unexpected sheet response: {0}")]
    Malformed(String),
}

/// One student's answers, as read at the start of the run.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentRow {
    /// 0-based sheet row (the header is row 0).
    pub index: usize,
    /// Cell values in header order; may be shorter than the header.
    pub cells: Vec<String>,
}

impl StudentRow {
    /// Returns the cell under `column`, or `""` when the row is short.
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    /// First cell, or `Row{n}` (1-based sheet row) when it is empty.
    pub fn student_id(&self) -> String {
        match self.cells.first().map(|c| c.trim()) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("Row{}", self.index + 1),
        }
    }
}

/// Header plus all student rows, taken once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetSnapshot {
    /// Column names.
    pub header: Vec<String>,
    /// Student rows in stored order.
    pub rows:   Vec<StudentRow>,
}

impl SheetSnapshot {
    /// Splits a raw grid into header and student rows.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header = grid.remove(0);
        let rows = grid
            .into_iter()
            .enumerate()
            .map(|(i, cells)| StudentRow {
                index: i + 1,
                cells,
            })
            .collect();
        Self { header, rows }
    }

    /// Position of `name` in the header.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// A single cell overwrite.
#[derive(Clone, Debug, PartialEq)]
pub struct CellWrite {
    /// 0-based row.
    pub row:    usize,
    /// 0-based column.
    pub column: usize,
    /// New value.
    pub value:  String,
}

impl CellWrite {
    /// Creates a cell write.
    pub fn new(row: usize, column: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            column,
            value: value.into(),
        }
    }
}

/// Where feedback and grade go for every student row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputColumns {
    /// Column of the feedback text.
    pub feedback: usize,
    /// Column of the total grade.
    pub grade:    usize,
}

/// Tabular store of student answers.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Human-readable name of the store, for logs.
    async fn title(&self) -> Result<String, SheetError>;

    /// Reads the header and every row.
    async fn read_all(&self) -> Result<SheetSnapshot, SheetError>;

    /// Overwrites the given cells, growing the sheet if needed.
    async fn write_cells(&self, cells: &[CellWrite]) -> Result<(), SheetError>;
}

/// Decides the output columns for `header` and the header cells that must be
/// written to create missing ones. Existing columns are reused; missing ones
/// are appended, feedback before grade.
pub fn plan_output_columns(header: &[String]) -> (OutputColumns, Vec<CellWrite>) {
    let find = |name: &str| header.iter().position(|h| h == name);
    let mut next = header.len();
    let mut writes = Vec::new();

    let mut place = |name: &str| match find(name) {
        Some(existing) => existing,
        None => {
            let column = next;
            next += 1;
            writes.push(CellWrite::new(0, column, name));
            column
        }
    };

    let feedback = place(FEEDBACK_COLUMN);
    let grade = place(GRADE_COLUMN);
    (OutputColumns { feedback, grade }, writes)
}

/// Resolves the output columns and writes labels for any that were created.
pub async fn resolve_output_columns(
    store: &dyn SheetStore,
    header: &[String],
) -> Result<OutputColumns, SheetError> {
    let (columns, writes) = plan_output_columns(header);
    if !writes.is_empty() {
        store.write_cells(&writes).await?;
    }
    Ok(columns)
}

/// Overwrites the feedback and grade cells of one row.
pub async fn write_result(
    store: &dyn SheetStore,
    row: usize,
    columns: OutputColumns,
    feedback: &str,
    grade: &str,
) -> Result<(), SheetError> {
    store
        .write_cells(&[
            CellWrite::new(row, columns.feedback, feedback),
            CellWrite::new(row, columns.grade, grade),
        ])
        .await
}
