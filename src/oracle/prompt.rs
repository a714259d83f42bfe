#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Write;

use crate::answer_key::Question;

/// Builds the grading instructions sent to the oracle for one answer.
#[derive(Clone, Debug, Default)]
pub struct Rubric {
    /// Common-mistake hints appended to every prompt; empty means none.
    hints: Vec<String>,
}

impl Rubric {
    /// A rubric without any hints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds common-mistake hints to every prompt built by this rubric.
    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }

    /// Hints currently injected into prompts.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Renders the prompt for `student_answer` to `question`.
    pub fn build(&self, question: &Question, student_answer: &str) -> String {
        let max = question.max_points;
        let mut prompt = format!(
            "You are a generous, fair, human-like grader for a university course.
Assume good intent from the student and give the highest reasonable score when in doubt.
Judge how close the student's answer is to the correct one by reasoning, not by string comparison.

Grading principles:
1. Treat answers as equivalent if they differ only by whitespace, line breaks (including CRLF), \
capitalization, or missing padding symbols like '=='.
2. Award credit in proportion to how close the answer is, not only for exact matches.
   - Small differences (one or two wrong characters, spacing, minor formatting) still earn 80-90% \
of the credit.
   - Clear understanding that misses a small detail earns about {near:.2} of {max:.2}.
   - Large missing parts with the right intent earn partial credit of about {partial:.2}.
   - Only give 0.0 when the answer is blank or clearly unrelated.
3. Copy/paste or encoding artifacts are minor issues, not full errors.
4. Answers with the same kind of mistake must receive similar scores.
5. Respond with exactly one JSON object and no other text:

{{
  \"score\": <number between 0.0 and {max:.2}>,
  \"feedback\": \"<one or two sentences of natural explanation>\",
  \"mistake_tag\": \"<short label like 'minor copy error', 'incomplete', 'exact'>\"
}}
",
            near = max * 0.85,
            partial = max * 0.5,
        );

        if !self.hints.is_empty() {
            prompt.push_str("\nCommon mistakes seen in earlier submissions:\n");
            for hint in &self.hints {
                let _ = writeln!(prompt, "- {hint}");
            }
        }

        let _ = write!(
            prompt,
            "\nQuestion: {}\nCorrect answer: {}\nStudent answer: {}\n",
            question.name, question.canonical_answer, student_answer
        );
        prompt
    }
}
