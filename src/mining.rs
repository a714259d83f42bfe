#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Mines a historical sheet of notes for recurring mistakes.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::{constants::MAX_HINTS, sheet::SheetStore};

/// Case-insensitive patterns paired with the hint they produce, in reporting
/// order.
static PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bpadding\b", "base64 padding ('==') missing"),
        (r"(?i)\bCRLF\b|\bnewline\b", "extra newline (CRLF) in Base64"),
        (r"(?i)\bbytes? missing\b|\bincomplete\b", "incomplete byte sequence in Bits"),
        (r"(?i)\bspacing\b|\bspaces\b", "spacing/formatting differences"),
        (r"(?i)\bleading zero\b", "leading-zero formatting in Decimal/Hex"),
    ]
    .into_iter()
    .map(|(pattern, hint)| (Regex::new(pattern).expect("valid mistake pattern"), hint))
    .collect()
});

/// Returns the distinct hints whose pattern occurs in `text`, in pattern
/// order, at most [`MAX_HINTS`].
pub fn mine_hints(text: &str) -> Vec<String> {
    PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, hint)| hint.to_string())
        .unique()
        .take(MAX_HINTS)
        .collect()
}

/// Reads every data row of `source` and mines it for hints. No source, or any
/// failure reading it, yields no hints.
pub async fn mine_common_mistakes(source: Option<&dyn SheetStore>) -> Vec<String> {
    let Some(store) = source else {
        return Vec::new();
    };

    match store.read_all().await {
        Ok(snapshot) => {
            let text = snapshot
                .rows
                .iter()
                .map(|row| row.cells.join(" "))
                .join(" ");
            let hints = mine_hints(&text);
            tracing::info!("Mined {} common-mistake hint(s) from history", hints.len());
            hints
        }
        Err(e) => {
            tracing::warn!("Could not read historical sheet: {e}");
            Vec::new()
        }
    }
}
