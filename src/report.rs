#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use anyhow::{Context, Result};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::grade::{GradeRecord, MistakeTally};

/// A row of the mistake-tag summary.
#[derive(Tabled)]
struct TagCount {
    /// Mistake tag.
    #[tabled(rename = "Mistake tag")]
    tag:   String,
    /// Occurrences this run.
    #[tabled(rename = "Count")]
    count: usize,
}

/// Renders the `top_n` most common mistake tags as a table.
pub fn tag_summary(tally: &MistakeTally, top_n: usize) -> String {
    let rows: Vec<TagCount> = tally
        .most_common(top_n)
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();

    Table::new(&rows)
        .with(Style::modern())
        .with(Panel::header("Most common mistake tags this run"))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// Renders every student's grade and feedback as a table.
pub fn grading_overview(records: &[GradeRecord]) -> String {
    let rows: Vec<_> = records.iter().map(GradeRecord::export_row).collect();
    let total: f64 = records.iter().map(|r| r.total).sum();
    let mean = if records.is_empty() {
        0.0
    } else {
        total / records.len() as f64
    };

    Table::new(&rows)
        .with(Panel::header("Grading Overview"))
        .with(Panel::footer(format!("Students: {}  Mean grade: {mean:.2}", records.len())))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}

/// Writes `Student ID, Grade, Feedback` for every record to `path`.
///
/// The export mirrors what this run wrote to the sheet, taken from the
/// in-memory records rather than read back from the store.
pub fn export_csv(records: &[GradeRecord], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Could not create export file {}", path.display()))?;
    writer
        .write_record(["Student ID", "Grade", "Feedback"])
        .context("Could not write export header")?;
    for record in records {
        writer
            .serialize(record.export_row())
            .with_context(|| format!("Could not write export row for {}", record.student_id))?;
    }
    writer
        .flush()
        .with_context(|| format!("Could not flush export file {}", path.display()))?;
    Ok(())
}
