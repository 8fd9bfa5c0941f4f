//! Anthropic Messages API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::client::{Endpoint, decode_json, send_with_retry};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

const PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    endpoint: Endpoint,
}

impl AnthropicClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    fn body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.endpoint.model,
            "max_tokens": self.endpoint.token_budget(request.max_tokens),
            "system": request.system_prompt,
            "messages": request.messages,
        })
    }

    /// Only `text` blocks count; they are concatenated in order
    fn into_completion(reply: MessagesReply) -> CompletionResponse {
        debug!(blocks = reply.content.len(), stop_reason = ?reply.stop_reason, "AnthropicClient::into_completion: called");
        let text: String = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        CompletionResponse {
            content: (!text.is_empty()).then_some(text),
            stop_reason: reply
                .stop_reason
                .as_deref()
                .map_or(StopReason::EndTurn, StopReason::from_anthropic),
            usage: TokenUsage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, turns = request.messages.len(), "AnthropicClient::complete: called");
        let url = self.endpoint.url(PATH);
        let body = self.body(&request);

        let response = send_with_retry(self.endpoint.max_retries, || {
            self.endpoint
                .http
                .post(&url)
                .header("x-api-key", &self.endpoint.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body)
        })
        .await?;

        Ok(Self::into_completion(decode_json(response).await?))
    }

    fn provider(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: ReplyUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client(ceiling: u32) -> AnthropicClient {
        AnthropicClient {
            endpoint: Endpoint::fixture("claude-sonnet-4", "https://api.anthropic.com", ceiling),
        }
    }

    #[test]
    fn test_body_keeps_system_prompt_separate() {
        let request = CompletionRequest {
            system_prompt: "You are a running coach".to_string(),
            messages: vec![
                Message::user("Hello"),
                Message::assistant("Hi"),
                Message::user("5k plan?"),
            ],
            max_tokens: 500,
        };

        let body = client(8192).body(&request);

        assert_eq!(body["model"], "claude-sonnet-4");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["system"], "You are a running coach");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "5k plan?");
    }

    #[test]
    fn test_body_caps_token_budget() {
        let request = CompletionRequest {
            system_prompt: String::new(),
            messages: vec![],
            max_tokens: 5000,
        };
        assert_eq!(client(1000).body(&request)["max_tokens"], 1000);
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let json = r#"{
            "content": [{"type": "text", "text": "Day 1: "}, {"type": "tool_use"}, {"type": "text", "text": "Run"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 4}
        }"#;
        let reply: MessagesReply = serde_json::from_str(json).unwrap();
        let resp = AnthropicClient::into_completion(reply);
        assert_eq!(resp.content.as_deref(), Some("Day 1: Run"));
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.usage.output_tokens, 4);
    }

    #[test]
    fn test_no_text_means_no_content() {
        let json = r#"{"content": [], "stop_reason": "max_tokens", "usage": {"input_tokens": 1, "output_tokens": 0}}"#;
        let reply: MessagesReply = serde_json::from_str(json).unwrap();
        let resp = AnthropicClient::into_completion(reply);
        assert!(resp.content.is_none());
        assert_eq!(resp.stop_reason, StopReason::MaxTokens);
    }
}
