#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::constants::{API_ERROR_FRAGMENT, FEEDBACK_DELIMITER};

/// The graded outcome of one student row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    /// 0-based sheet row.
    pub row:        usize,
    /// Student identifier.
    pub student_id: String,
    /// Sum of clamped per-question scores.
    pub total:      f64,
    /// Per-question feedback fragments, in question order.
    pub feedback:   Vec<String>,
}

impl GradeRecord {
    /// An empty record for a row.
    pub fn new(row: usize, student_id: impl Into<String>) -> Self {
        Self {
            row,
            student_id: student_id.into(),
            ..Self::default()
        }
    }

    /// Adds the clamped `points` to the total and records the score the
    /// oracle actually returned alongside its explanation.
    pub fn add_judged(&mut self, question: &str, score: f64, points: f64, feedback: &str) {
        self.total += points;
        self.feedback
            .push(format!("{question} ({score:.2}): {}", feedback.trim()));
    }

    /// Notes that `question` could not be judged; it contributes nothing.
    pub fn add_unavailable(&mut self, question: &str) {
        self.feedback
            .push(format!("{question}: {API_ERROR_FRAGMENT}"));
    }

    /// Total formatted with two decimals, as written to the sheet.
    pub fn grade_text(&self) -> String {
        format!("{:.2}", self.total)
    }

    /// Feedback fragments joined with the fixed delimiter.
    pub fn feedback_text(&self) -> String {
        self.feedback.join(FEEDBACK_DELIMITER)
    }

    /// Flattens the record into an export row.
    pub fn export_row(&self) -> ExportRow {
        ExportRow {
            student_id: self.student_id.clone(),
            grade:      self.grade_text(),
            feedback:   self.feedback_text(),
        }
    }
}

/// One line of the CSV export and of the overview table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct ExportRow {
    /// Student identifier.
    #[serde(rename = "Student ID")]
    #[tabled(rename = "Student ID")]
    pub student_id: String,
    /// Total, two decimals.
    #[serde(rename = "Grade")]
    #[tabled(rename = "Grade")]
    pub grade:      String,
    /// Joined feedback.
    #[serde(rename = "Feedback")]
    #[tabled(rename = "Feedback")]
    pub feedback:   String,
}
