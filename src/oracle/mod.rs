#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The scoring oracle: a remote model that judges one student answer at a
//! time.

/// Chat-completions client for the remote model.
pub mod http;
/// Rubric prompt construction.
pub mod prompt;
/// Parsing the model's free-form reply into a judgment.
pub mod reply;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpOracle;
pub use prompt::Rubric;
pub use reply::{ReplyError, parse_reply};

use crate::answer_key::Question;

/// The oracle's verdict on one answer to one question.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    /// Points awarded; not yet clamped to the question's range.
    pub score:       f64,
    /// Short explanation for the student.
    pub feedback:    String,
    /// Short label characterising the mistake, possibly empty.
    pub mistake_tag: String,
}

impl Judgment {
    /// Creates a judgment.
    pub fn new(score: f64, feedback: impl Into<String>, mistake_tag: impl Into<String>) -> Self {
        Self {
            score,
            feedback: feedback.into(),
            mistake_tag: mistake_tag.into(),
        }
    }
}

/// Failure to obtain any reply from the oracle.
#[derive(thiserror::Error, Debug)]
pub enum OracleError {
    /// The request never produced an HTTP response (connect, timeout, ...).
    #[error("request to scoring oracle failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The oracle answered with a non-success status.
    #[error("{status} {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        body:   String,
    },
    /// A success response without `choices[0].message.content`.
    #[error("scoring oracle response had no message content: {0}")]
    MissingContent(String),
}

/// Outcome of judging one answer.
#[derive(Debug)]
pub enum Verdict {
    /// The reply contained a well-formed JSON judgment.
    Parsed(Judgment),
    /// The reply was not valid JSON; fields were recovered by pattern matching.
    Fallback(Judgment),
    /// No usable reply was received.
    Unavailable(OracleError),
}

impl Verdict {
    /// Returns the judgment, if the oracle produced one by either strategy.
    pub fn judgment(&self) -> Option<&Judgment> {
        match self {
            Verdict::Parsed(j) | Verdict::Fallback(j) => Some(j),
            Verdict::Unavailable(_) => None,
        }
    }
}

/// Something that can judge a student answer against a question's canonical
/// answer. Implementations never fail: transport problems are reported as
/// [`Verdict::Unavailable`].
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Judges `student_answer` for `question`.
    async fn judge(&self, question: &Question, student_answer: &str) -> Verdict;
}
