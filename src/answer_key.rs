#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::constants::{BUILTIN_QUIZ, DEFAULT_MAX_POINTS};

/// Returns the default per-question maximum, used by serde.
fn default_max_points() -> f64 {
    DEFAULT_MAX_POINTS
}

/// A single quiz question, keyed by the sheet column holding its answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Column header the student answers live under.
    pub name:             String,
    /// Expected answer the student answer is compared against.
    pub canonical_answer: String,
    /// Points awarded for a fully correct answer.
    #[serde(default = "default_max_points")]
    pub max_points:       f64,
}

impl Question {
    /// Creates a question worth the default number of points.
    pub fn new(name: impl Into<String>, canonical_answer: impl Into<String>) -> Self {
        Self {
            name:             name.into(),
            canonical_answer: canonical_answer.into(),
            max_points:       DEFAULT_MAX_POINTS,
        }
    }

    /// Restricts `score` to `[0, max_points]`; NaN counts as zero.
    pub fn clamp(&self, score: f64) -> f64 {
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, self.max_points)
    }
}

/// Ordered, read-only mapping from question name to canonical answer.
#[derive(Clone, Debug, PartialEq)]
pub struct AnswerKey {
    /// Questions in grading order.
    questions: Vec<Question>,
}

impl Default for AnswerKey {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AnswerKey {
    /// Builds a key from questions, keeping their order.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The four-question encoding quiz.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_QUIZ
                .iter()
                .map(|(name, answer)| Question::new(*name, *answer))
                .collect(),
        )
    }

    /// Loads a key from a JSON array of `{name, canonical_answer,
    /// max_points?}` objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let questions: Vec<Question> =
            serde_json::from_str(json).context("Answer key must be a JSON array of questions")?;
        ensure!(!questions.is_empty(), "Answer key contains no questions");
        for q in &questions {
            ensure!(
                q.max_points.is_finite() && q.max_points >= 0.0,
                "Question `{}` has an invalid max_points value ({})",
                q.name,
                q.max_points
            );
        }
        Ok(Self::new(questions))
    }

    /// Reads and parses a JSON answer key file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read answer key {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Could not parse answer key {}", path.display()))
    }

    /// Questions in grading order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Looks a question up by its column name.
    pub fn get(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.name == name)
    }

    /// Sum of every question's maximum.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.max_points).sum()
    }
}
