#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use crate::constants::UNSPECIFIED_TAG;

/// Trims `tag`, mapping a blank tag to `unspecified`.
pub fn normalize_tag(tag: &str) -> &str {
    match tag.trim() {
        "" => UNSPECIFIED_TAG,
        t => t,
    }
}

/// Counts mistake tags across a run. Ties in [`MistakeTally::most_common`]
/// keep first-seen order.
#[derive(Clone, Debug, Default)]
pub struct MistakeTally {
    /// Tags with their counts, in first-seen order.
    entries: Vec<(String, usize)>,
    /// Position of each tag in `entries`.
    index:   HashMap<String, usize>,
}

impl MistakeTally {
    /// An empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `tag`; blank tags count as `unspecified`.
    pub fn record(&mut self, tag: &str) {
        let tag = normalize_tag(tag);
        match self.index.get(tag).copied() {
            Some(i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(tag.to_string(), self.entries.len());
                self.entries.push((tag.to_string(), 1));
            }
        }
    }

    /// Occurrences of `tag`.
    pub fn count(&self, tag: &str) -> usize {
        self.index.get(tag).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    /// Total number of recorded tags.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most frequent tags, most frequent first.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}
