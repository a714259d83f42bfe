mod common;

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use common::{FnOracle, canonical_row, exact_match_oracle, quiz_sheet, unavailable};
use sheetgrade::{
    AnswerKey, Judgment, Question, SheetError, SheetSnapshot, SheetStore, Verdict, grade_sheet,
    sheet::{CellWrite, MemorySheet},
};
use tokio::time::Instant;

/// Memory sheet that rejects every write touching one row.
struct RejectsRow {
    inner: MemorySheet,
    row:   usize,
}

#[async_trait]
impl SheetStore for RejectsRow {
    async fn title(&self) -> Result<String, SheetError> {
        self.inner.title().await
    }

    async fn read_all(&self) -> Result<SheetSnapshot, SheetError> {
        self.inner.read_all().await
    }

    async fn write_cells(&self, cells: &[CellWrite]) -> Result<(), SheetError> {
        if cells.iter().any(|c| c.row == self.row) {
            return Err(SheetError::Api {
                status: 429,
                body:   "Quota exceeded".into(),
            });
        }
        self.inner.write_cells(cells).await
    }
}

#[tokio::test]
async fn canonical_answers_earn_full_marks() {
    let sheet = quiz_sheet(vec![canonical_row("alice")]);
    let oracle = exact_match_oracle();

    let (records, _) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].student_id, "alice");
    assert_eq!(records[0].grade_text(), "2.00");
    assert_eq!(records[0].feedback.len(), 4);
    assert!(records[0].feedback[0].starts_with("Bits answer (0.50): Correct"));

    // header gains Feedback then Grade, row 1 receives the results
    assert_eq!(sheet.cell(0, 5).as_deref(), Some("Feedback"));
    assert_eq!(sheet.cell(0, 6).as_deref(), Some("Grade"));
    assert_eq!(sheet.cell(1, 6).as_deref(), Some("2.00"));
    assert_eq!(
        sheet.cell(1, 5).expect("feedback cell"),
        records[0].feedback_text()
    );
}

#[tokio::test]
async fn out_of_range_scores_are_clamped() {
    let sheet = quiz_sheet(vec![canonical_row("bob")]);
    let oracle = FnOracle::new(|q: &Question, _: &str| {
        let score = match q.name.as_str() {
            "Bits answer" => 1.3,
            "Decimal answer" => -0.2,
            "Hex answer" => 0.25,
            _ => f64::NAN,
        };
        Verdict::Parsed(Judgment::new(score, "judged", "tag"))
    });

    let (records, _) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    let record = &records[0];
    assert!((record.total - 0.75).abs() < 1e-9);
    assert_eq!(record.grade_text(), "0.75");
    // fragments keep the oracle's own score; only the total is clamped
    assert!(record.feedback[0].starts_with("Bits answer (1.30): judged"));
    assert!(record.feedback[1].starts_with("Decimal answer (-0.20): judged"));
    assert!(record.feedback[2].starts_with("Hex answer (0.25): judged"));
}

#[tokio::test]
async fn missing_question_column_is_skipped() {
    let sheet = MemorySheet::new(
        "quiz",
        vec![
            vec!["Student ID", "Bits answer", "Decimal answer", "Base64 answer"],
            vec!["carol", "01010111 01101000 01100001 01110100", "87 104 97 116", "V2hhdA=="],
        ],
    );
    let oracle = FnOracle::new(|q: &Question, _: &str| {
        Verdict::Parsed(Judgment::new(q.max_points, "ok", ""))
    });

    let (records, _) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("a missing column must not abort the run");

    assert_eq!(records[0].grade_text(), "1.50");
    assert_eq!(records[0].feedback.len(), 3);
    assert!(records[0].feedback.iter().all(|f| !f.contains("Hex answer")));
    assert!(oracle.calls().iter().all(|(q, _)| q != "Hex answer"));
}

#[tokio::test]
async fn oracle_failure_does_not_stop_the_row_or_the_run() {
    let sheet = quiz_sheet(vec![canonical_row("dave"), canonical_row("erin")]);
    let oracle = FnOracle::new(|q: &Question, _: &str| {
        if q.name == "Decimal answer" {
            unavailable()
        } else {
            Verdict::Parsed(Judgment::new(q.max_points, "ok", "exact"))
        }
    });

    let (records, tally) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.grade_text(), "1.50");
        assert_eq!(record.feedback[1], "Decimal answer: API error");
        assert!(record.feedback[2].starts_with("Hex answer (0.50)"));
    }
    assert_eq!(oracle.calls().len(), 8);
    // unavailable judgments are not tallied
    assert_eq!(tally.count("exact"), 6);
    assert_eq!(tally.total(), 6);
}

#[tokio::test]
async fn fallback_judgments_count_toward_the_total() {
    let sheet = quiz_sheet(vec![canonical_row("fay")]);
    let oracle = FnOracle::new(|_: &Question, _: &str| {
        Verdict::Fallback(Judgment::new(0.3, "good attempt", ""))
    });

    let (records, tally) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    assert_eq!(records[0].grade_text(), "1.20");
    assert_eq!(tally.count("unspecified"), 4);
}

#[tokio::test]
async fn rows_are_graded_in_order_with_trimmed_answers() {
    let sheet = quiz_sheet(vec![
        vec!["gus".into(), "  01010111  ".into()],
        vec!["".into(), "x".into(), "y".into(), "z".into(), "w".into()],
    ]);
    let oracle = exact_match_oracle();

    let (records, _) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    assert_eq!(records.iter().map(|r| r.row).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(records[1].student_id, "Row3");

    let calls = oracle.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(calls[0], ("Bits answer".to_string(), "01010111".to_string()));
    // short rows grade as empty answers
    assert_eq!(calls[1], ("Decimal answer".to_string(), String::new()));
    assert_eq!(calls[4].1, "x");

    assert_eq!(sheet.cell(2, 6).as_deref(), Some("0.00"));
}

#[tokio::test]
async fn existing_output_columns_are_reused() {
    let mut header: Vec<String> = common::quiz_header().into_iter().map(String::from).collect();
    header.insert(1, "Grade".into());
    header.push("Feedback".into());
    let mut row = canonical_row("hana");
    row.insert(1, "stale".into());
    row.push("stale".into());
    let sheet = MemorySheet::new("quiz", vec![header.clone(), row]);

    grade_sheet(&sheet, &exact_match_oracle(), &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    let grid = sheet.grid();
    assert_eq!(grid[0], header);
    assert_eq!(grid[1][1], "2.00");
    assert!(grid[1][6].starts_with("Bits answer (0.50)"));
}

#[tokio::test]
async fn mistake_tags_are_tallied_across_rows() {
    let sheet = quiz_sheet(vec![canonical_row("ivy"), canonical_row("jon")]);
    let oracle = FnOracle::new(|q: &Question, _: &str| {
        let tag = match q.name.as_str() {
            "Base64 answer" => "missing padding",
            "Hex answer" => "  ",
            _ => "case",
        };
        Verdict::Parsed(Judgment::new(0.4, "", tag))
    });

    let (_, tally) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("grading should succeed");

    assert_eq!(tally.count("case"), 4);
    assert_eq!(tally.count("missing padding"), 2);
    assert_eq!(tally.count("unspecified"), 2);
    assert_eq!(
        tally.most_common(2),
        vec![("case".to_string(), 4), ("unspecified".to_string(), 2)]
    );
}

#[tokio::test]
async fn empty_sheet_grades_nothing() {
    let sheet = MemorySheet::new("empty", Vec::<Vec<String>>::new());
    let oracle = exact_match_oracle();

    let (records, tally) = grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::ZERO)
        .await
        .expect("an empty sheet is not an error");

    assert!(records.is_empty());
    assert!(tally.is_empty());
    assert!(oracle.calls().is_empty());
}

#[tokio::test]
async fn failed_write_does_not_stop_later_rows() {
    let sheet = RejectsRow {
        inner: quiz_sheet(vec![canonical_row("kim"), canonical_row("lee")]),
        row:   1,
    };

    let (records, _) = grade_sheet(
        &sheet,
        &exact_match_oracle(),
        &AnswerKey::builtin(),
        Duration::ZERO,
    )
    .await
    .expect("a failed row write must not abort the run");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].grade_text(), "2.00");
    assert_eq!(records[1].student_id, "lee");
    assert_eq!(sheet.inner.cell(1, 6), None);
    assert_eq!(sheet.inner.cell(2, 6).as_deref(), Some("2.00"));
    assert_eq!(sheet.inner.cell(0, 6).as_deref(), Some("Grade"));
}

#[tokio::test(start_paused = true)]
async fn rows_are_spaced_by_the_row_delay() {
    let start = Instant::now();
    let seen: Mutex<Vec<Duration>> = Mutex::new(Vec::new());
    let oracle = FnOracle::new(|q: &Question, _: &str| {
        if q.name == "Bits answer" {
            seen.lock().unwrap().push(start.elapsed());
        }
        Verdict::Parsed(Judgment::new(q.max_points, "ok", "exact"))
    });
    let sheet = quiz_sheet(vec![
        canonical_row("mo"),
        canonical_row("ned"),
        canonical_row("ola"),
    ]);

    grade_sheet(&sheet, &oracle, &AnswerKey::builtin(), Duration::from_millis(400))
        .await
        .expect("grading should succeed");

    assert_eq!(start.elapsed(), Duration::from_millis(800));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Duration::ZERO,
            Duration::from_millis(400),
            Duration::from_millis(800)
        ]
    );
}
