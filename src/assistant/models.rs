//! Request and response types for the messages API

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Models the assistant can answer with
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssistantModel {
    /// Fast and cheap, good enough for documentation lookups
    #[default]
    Haiku,
    Sonnet,
    Opus,
}

impl AssistantModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Haiku => "claude-haiku-4-5-20251001",
            Self::Sonnet => "claude-sonnet-4-5-20250929",
            Self::Opus => "claude-opus-4-5-20251101",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Haiku => "Claude Haiku 4.5",
            Self::Sonnet => "Claude Sonnet 4.5",
            Self::Opus => "Claude Opus 4.5",
        }
    }

    /// Accepts short names and full model ids
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "haiku" | "claude-haiku-4-5-20251001" => Some(Self::Haiku),
            "sonnet" | "claude-sonnet-4-5-20250929" => Some(Self::Sonnet),
            "opus" | "claude-opus-4-5-20251101" => Some(Self::Opus),
            _ => None,
        }
    }

    pub fn all() -> &'static [AssistantModel] {
        &[Self::Haiku, Self::Sonnet, Self::Opus]
    }
}

impl FromStr for AssistantModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown model: {}. Options: haiku, sonnet, opus", s))
    }
}

impl fmt::Display for AssistantModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Body of a `POST /v1/messages` call
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
}

impl CreateMessageRequest {
    /// Default answer length for documentation questions
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;

    pub fn new(model: AssistantModel, messages: Vec<Message>) -> Self {
        Self {
            model: model.model_id().to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            messages,
            system: None,
            stream: true,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn without_streaming(mut self) -> Self {
        self.stream = false;
        self
    }
}

/// Parsed server-sent events from a streaming answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The answer has started
    Started { id: String },
    /// Next chunk of answer text
    Delta { text: String },
    /// Stop reason reported before the end of the stream
    StopReason(String),
    /// The answer is complete
    Finished,
    /// The backend reported an error mid-stream
    Error { message: String },
}

/// Non-streaming answer
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

impl MessageResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content.iter().filter_map(|block| block.text.as_deref()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_parse() {
        assert_eq!(AssistantModel::parse("haiku"), Some(AssistantModel::Haiku));
        assert_eq!(AssistantModel::parse(" Sonnet "), Some(AssistantModel::Sonnet));
        assert_eq!(AssistantModel::parse("claude-opus-4-5-20251101"), Some(AssistantModel::Opus));
        assert_eq!(AssistantModel::parse("gpt"), None);
        assert!("gpt".parse::<AssistantModel>().is_err());
    }

    #[test]
    fn model_round_trips_through_config_json() {
        let json = serde_json::to_string(&AssistantModel::Sonnet).unwrap();
        assert_eq!(json, "\"sonnet\"");
        assert_eq!(serde_json::from_str::<AssistantModel>(&json).unwrap(), AssistantModel::Sonnet);
    }

    #[test]
    fn request_serializes_without_empty_system() {
        let request = CreateMessageRequest::new(AssistantModel::Haiku, vec![Message::user("Hi")])
            .with_max_tokens(10)
            .without_streaming();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "claude-haiku-4-5-20251001");
        assert_eq!(json["max_tokens"], 10);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("system").is_none());
    }

    #[test]
    fn response_text_joins_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "Open "},
                {"type": "tool_use"},
                {"type": "text", "text": "Settings."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 5, "output_tokens": 3}
        }"#;
        let response: MessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), "Open Settings.");
    }
}
