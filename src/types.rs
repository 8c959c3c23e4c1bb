// Shared data model: chat roles, messages, the transcript that gets persisted
// to `chat.log`, the known model set and per-request generation parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// System prompt used whenever a fresh transcript is started.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Who authored a message. Serialized lowercase to match the wire format.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message. Messages are never edited once created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Message::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::new(Role::Assistant, content)
    }
}

/// The ordered conversation history. It always starts with one system
/// message and only grows by appending; on disk it is a plain JSON array.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A fresh transcript holding only the default system prompt.
    pub fn new() -> Self {
        Transcript::with_system_prompt(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Transcript {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when the first message is the system prompt. Decoded transcripts
    /// are checked with this before being handed out.
    pub fn starts_with_system(&self) -> bool {
        matches!(self.messages.first(), Some(m) if m.role == Role::System)
    }

    /// Flatten the conversation into `role: content` lines.
    pub fn to_plain_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Transcript::new()
    }
}

/// Models the completion client accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Gpt35Turbo,
    Gpt4,
    Gpt4o,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Gpt35Turbo, Model::Gpt4, Model::Gpt4o];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Gpt35Turbo => "gpt-3.5-turbo",
            Model::Gpt4 => "gpt-4",
            Model::Gpt4o => "gpt-4o",
        }
    }

    /// Cheapest known model; good enough for short summaries.
    pub fn cheapest() -> Model {
        Model::Gpt35Turbo
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = crate::error::CompletionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| crate::error::CompletionError::UnknownModel(s.to_string()))
    }
}

/// Sampling settings for one request. `None` fields are left out of the
/// request body entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    pub model: String,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl GenerationParameters {
    pub fn new(model: impl Into<String>) -> Self {
        GenerationParameters {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transcript_has_single_system_message() {
        let t = Transcript::new();
        assert_eq!(t.len(), 1);
        assert!(t.starts_with_system());
        assert_eq!(t.messages()[0].content, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn transcript_serializes_as_plain_array() {
        let mut t = Transcript::new();
        t.push_user("hi");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "system", "content": DEFAULT_SYSTEM_PROMPT},
                {"role": "user", "content": "hi"}
            ])
        );
    }

    #[test]
    fn plain_text_uses_role_prefixes() {
        let mut t = Transcript::with_system_prompt("be brief");
        t.push_user("hi");
        t.push_assistant("hello");
        assert_eq!(t.to_plain_text(), "system: be brief\nuser: hi\nassistant: hello");
    }

    #[test]
    fn model_parse_accepts_only_known_names() {
        assert_eq!("gpt-4o".parse::<Model>().unwrap(), Model::Gpt4o);
        assert_eq!("gpt-3.5-turbo".parse::<Model>().unwrap(), Model::cheapest());
        assert!("gpt-5-ultra".parse::<Model>().is_err());
    }
}
