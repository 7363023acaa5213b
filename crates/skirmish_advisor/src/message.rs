//! Chat-completion wire types.
//!
//! Only the fields the advisor reads or writes are modelled; unknown fields
//! in replies are ignored.

use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;
use crate::error::{AdvisoryError, Result};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,
    /// The player's question.
    User,
    /// The model's reply.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who is speaking.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// Request body for a non-streaming completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model name.
    pub model: String,
    /// System message followed by the user prompt.
    pub messages: Vec<ChatMessage>,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Always `false`.
    pub stream: bool,
}

impl ChatRequest {
    /// System + user request built from `config`.
    #[must_use]
    pub fn new(config: &AdvisorConfig, user_prompt: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: config.system_prompt.clone(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user_prompt.into(),
                },
            ],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stream: false,
        }
    }
}

/// One candidate reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    /// Position in the choice list.
    #[serde(default)]
    pub index: u32,
    /// Reply message.
    pub message: ChatMessage,
    /// Why generation stopped, when the server says.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Sum of both.
    #[serde(default)]
    pub total_tokens: u32,
}

/// Reply body of a completion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Server-assigned id.
    #[serde(default)]
    pub id: String,
    /// Model that answered.
    #[serde(default)]
    pub model: String,
    /// Candidate replies.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Token accounting.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Parses a reply body and extracts the first choice's content.
    pub fn first_content(body: &str) -> Result<String> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| AdvisoryError::Malformed(e.to_string()))?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AdvisoryError::EmptyResponse)
    }
}

/// Embeds a serialized game state under the player's prompt.
#[must_use]
pub fn compose_prompt(prompt: &str, state_json: &str) -> String {
    format!("{prompt}\n\n## Game State Data:\n```json\n{state_json}\n```")
}
