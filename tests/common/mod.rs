#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use sheetgrade::{
    Judgment, OracleError, Question, ScoringOracle, Verdict, constants::BUILTIN_QUIZ,
    sheet::MemorySheet,
};

/// Header of the built-in quiz sheet.
pub fn quiz_header() -> Vec<&'static str> {
    let mut header = vec!["Student ID"];
    header.extend(BUILTIN_QUIZ.iter().map(|(name, _)| *name));
    header
}

/// A row answering every built-in question with its canonical answer.
pub fn canonical_row(id: &str) -> Vec<String> {
    let mut row = vec![id.to_string()];
    row.extend(BUILTIN_QUIZ.iter().map(|(_, answer)| answer.to_string()));
    row
}

/// A built-in quiz sheet with the given student rows.
pub fn quiz_sheet(rows: Vec<Vec<String>>) -> MemorySheet {
    let header: Vec<String> = quiz_header().into_iter().map(String::from).collect();
    MemorySheet::new("quiz", std::iter::once(header).chain(rows))
}

/// Oracle driven by a closure, recording every call.
pub struct FnOracle<F> {
    judge: F,
    calls: Mutex<Vec<(String, String)>>,
}

impl<F> FnOracle<F>
where
    F: Fn(&Question, &str) -> Verdict + Send + Sync,
{
    pub fn new(judge: F) -> Self {
        Self {
            judge,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(question, answer)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> ScoringOracle for FnOracle<F>
where
    F: Fn(&Question, &str) -> Verdict + Send + Sync,
{
    async fn judge(&self, question: &Question, student_answer: &str) -> Verdict {
        self.calls
            .lock()
            .unwrap()
            .push((question.name.clone(), student_answer.to_string()));
        (self.judge)(question, student_answer)
    }
}

/// Full marks whenever the answer matches the canonical one exactly, zero
/// otherwise.
pub fn exact_match_oracle() -> FnOracle<impl Fn(&Question, &str) -> Verdict + Send + Sync> {
    FnOracle::new(|q: &Question, answer: &str| {
        if answer == q.canonical_answer {
            Verdict::Parsed(Judgment::new(q.max_points, "Correct", "exact"))
        } else {
            Verdict::Parsed(Judgment::new(0.0, "Does not match", "wrong"))
        }
    })
}

/// An oracle failure as the HTTP client would report it.
pub fn unavailable() -> Verdict {
    Verdict::Unavailable(OracleError::Status {
        status: 503,
        body:   "service unavailable".into(),
    })
}
