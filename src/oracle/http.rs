#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{OracleError, ScoringOracle, Verdict, prompt::Rubric, reply::parse_reply};
use crate::{answer_key::Question, config::OracleEnv, constants::ERROR_BODY_TRUNCATE};

/// One chat message in the request payload.
#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    /// Always `user`; the rubric travels as a single turn.
    role:    &'a str,
    /// Message text.
    content: &'a str,
}

/// Body of a chat-completions request.
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    /// Model identifier.
    model:    &'a str,
    /// Conversation, a single user turn.
    messages: Vec<ChatMessage<'a>>,
}

/// Scoring oracle backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct HttpOracle {
    /// Shared HTTP client.
    client:   reqwest::Client,
    /// Full URL of the chat-completions endpoint.
    endpoint: String,
    /// Model identifier.
    model:    String,
    /// Bearer token.
    api_key:  String,
    /// Upper bound on a single request.
    timeout:  Duration,
    /// Prompt builder.
    rubric:   Rubric,
}

impl HttpOracle {
    /// Creates an oracle from the configured endpoint credentials.
    pub fn new(client: reqwest::Client, env: &OracleEnv, rubric: Rubric) -> Self {
        Self {
            client,
            endpoint: env.endpoint().to_string(),
            model: env.model().to_string(),
            api_key: env.api_key().to_string(),
            timeout: env.timeout(),
            rubric,
        }
    }

    /// Returns the rubric used to build prompts.
    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Sends `prompt` as a single user turn and returns the reply text.
    pub async fn ask(&self, prompt: &str) -> Result<String, OracleError> {
        let payload = ChatRequest {
            model:    &self.model,
            messages: vec![ChatMessage {
                role:    "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body:   body.chars().take(ERROR_BODY_TRUNCATE).collect(),
            });
        }

        let body: Value = response.json().await?;
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                let snippet = body.to_string().chars().take(ERROR_BODY_TRUNCATE).collect();
                OracleError::MissingContent(snippet)
            })
    }
}

#[async_trait]
impl ScoringOracle for HttpOracle {
    async fn judge(&self, question: &Question, student_answer: &str) -> Verdict {
        let prompt = self.rubric.build(question, student_answer);
        match self.ask(&prompt).await {
            Ok(text) => parse_reply(&text),
            Err(err) => Verdict::Unavailable(err),
        }
    }
}
