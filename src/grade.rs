#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The grading loop: every student row, every question, one oracle call each.
//!
//! Rows are processed strictly in stored order and questions in answer-key
//! order, so writes land in increasing row order. A fixed pause between rows
//! is the only backpressure; rows are never graded concurrently.

/// Per-row grade records and their export form.
pub mod results;
/// Mistake-tag histogram.
pub mod tally;

use std::time::Duration;

use bon::Builder;

pub use results::{ExportRow, GradeRecord};
pub use tally::{MistakeTally, normalize_tag};

use crate::{
    answer_key::{AnswerKey, Question},
    constants::DEFAULT_ROW_DELAY,
    oracle::{ScoringOracle, Verdict},
    sheet::{OutputColumns, SheetSnapshot, SheetStore, StudentRow, write_result},
};

/// A question whose column was found in the header.
pub type LocatedQuestion<'a> = (&'a Question, usize);

/// Grades every row of a snapshot and writes the results back.
#[derive(Builder)]
pub struct GradingLoop<'a> {
    /// Questions and canonical answers.
    answer_key: &'a AnswerKey,
    /// Judge of individual answers.
    oracle:     &'a dyn ScoringOracle,
    /// Destination of grades and feedback.
    store:      &'a dyn SheetStore,
    /// Pause between consecutive rows.
    #[builder(default = DEFAULT_ROW_DELAY)]
    row_delay:  Duration,
}

impl<'a> GradingLoop<'a> {
    /// Pairs each answer-key question with its header column. Questions with
    /// no column are skipped for the whole run.
    pub fn locate_questions(&self, header: &[String]) -> Vec<LocatedQuestion<'a>> {
        let answer_key: &'a AnswerKey = self.answer_key;
        answer_key
            .questions()
            .iter()
            .filter_map(|q| match header.iter().position(|h| *h == q.name) {
                Some(column) => Some((q, column)),
                None => {
                    tracing::warn!("Column `{}` not found in header; skipping it", q.name);
                    None
                }
            })
            .collect()
    }

    /// Judges one row against the located questions, counting mistake tags
    /// into `tally`.
    pub async fn grade_row(
        &self,
        questions: &[LocatedQuestion<'_>],
        row: &StudentRow,
        tally: &mut MistakeTally,
    ) -> GradeRecord {
        let mut record = GradeRecord::new(row.index, row.student_id());

        for &(question, column) in questions {
            let answer = row.cell(column).trim();
            let verdict = self.oracle.judge(question, answer).await;

            let judgment = match verdict {
                Verdict::Parsed(judgment) => judgment,
                Verdict::Fallback(judgment) => {
                    tracing::debug!("  {}: reply was not JSON, used pattern fallback", question.name);
                    judgment
                }
                Verdict::Unavailable(err) => {
                    tracing::error!("  {}: {err}", question.name);
                    record.add_unavailable(&question.name);
                    continue;
                }
            };

            let points = question.clamp(judgment.score);
            let tag = normalize_tag(&judgment.mistake_tag);
            tracing::info!(
                "  {}: score={:.2}  tag={}  fb={}",
                question.name,
                judgment.score,
                tag,
                judgment.feedback
            );
            record.add_judged(&question.name, judgment.score, points, &judgment.feedback);
            tally.record(tag);
        }

        record
    }

    /// Grades every row of `snapshot`, writing feedback and grade to
    /// `columns` after each row. A failed write is logged and the run goes
    /// on.
    pub async fn run(
        &self,
        snapshot: &SheetSnapshot,
        columns: OutputColumns,
        tally: &mut MistakeTally,
    ) -> Vec<GradeRecord> {
        let questions = self.locate_questions(&snapshot.header);
        let mut records = Vec::with_capacity(snapshot.rows.len());

        for (i, row) in snapshot.rows.iter().enumerate() {
            if i > 0 && !self.row_delay.is_zero() {
                tokio::time::sleep(self.row_delay).await;
            }

            tracing::info!("Grading {}", row.student_id());
            let record = self.grade_row(&questions, row, tally).await;

            if let Err(e) = write_result(
                self.store,
                row.index,
                columns,
                &record.feedback_text(),
                &record.grade_text(),
            )
            .await
            {
                tracing::warn!("Could not write results for {}: {e}", record.student_id);
            }
            records.push(record);
        }

        records
    }
}
