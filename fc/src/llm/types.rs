//! Provider-neutral request and response shapes

use serde::{Deserialize, Serialize};

/// One model call: the rendered system prompt plus the turns to send
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,

    /// Oldest first; the final entry is the turn being answered
    pub messages: Vec<Message>,

    /// Upper bound requested by the caller; clients cap it at the configured ceiling
    pub max_tokens: u32,
}

/// A single conversation turn, serialized as `{"role": ..., "content": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// `None` when the model produced no text at all
    pub content: Option<String>,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain finished reply; handy for canned responses
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Normalized finish reason across providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    /// Cut off at the token budget; the text is likely incomplete
    MaxTokens,
    StopSequence,
    /// Withheld by a provider content filter
    Safety,
}

impl StopReason {
    /// Anthropic `stop_reason`
    pub fn from_anthropic(raw: &str) -> Self {
        match raw {
            "max_tokens" => Self::MaxTokens,
            "stop_sequence" => Self::StopSequence,
            "refusal" => Self::Safety,
            _ => Self::EndTurn,
        }
    }

    /// OpenAI `finish_reason`
    pub fn from_openai(raw: &str) -> Self {
        match raw {
            "length" => Self::MaxTokens,
            "content_filter" => Self::Safety,
            _ => Self::EndTurn,
        }
    }

    /// Gemini `finishReason`
    pub fn from_gemini(raw: &str) -> Self {
        match raw {
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => Self::Safety,
            _ => Self::EndTurn,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
