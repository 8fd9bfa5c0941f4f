//! OpenAI Chat Completions

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::client::{Endpoint, decode_json, send_with_retry};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

const PATH: &str = "/v1/chat/completions";

/// Reasoning-model families that reject `max_tokens`
const COMPLETION_TOKEN_MODELS: [&str; 3] = ["gpt-5", "o1", "o3"];

pub struct OpenAIClient {
    endpoint: Endpoint,
}

impl OpenAIClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    /// The system prompt travels as the first chat message
    fn body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!({ "role": "system", "content": request.system_prompt }));
        messages.extend(request.messages.iter().map(|m| json!(m)));

        let limit_field = if COMPLETION_TOKEN_MODELS
            .iter()
            .any(|prefix| self.endpoint.model.starts_with(prefix))
        {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };

        let mut body = json!({ "model": self.endpoint.model, "messages": messages });
        body[limit_field] = json!(self.endpoint.token_budget(request.max_tokens));
        body
    }

    fn into_completion(reply: ChatCompletion) -> Result<CompletionResponse, LlmError> {
        let usage = reply.usage.unwrap_or_default();
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Malformed("completion has no choices".to_string()))?;
        debug!(finish_reason = ?choice.finish_reason, "OpenAIClient::into_completion: called");

        Ok(CompletionResponse {
            content: choice.message.content.filter(|text| !text.is_empty()),
            stop_reason: choice
                .finish_reason
                .as_deref()
                .map_or(StopReason::EndTurn, StopReason::from_openai),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, turns = request.messages.len(), "OpenAIClient::complete: called");
        let url = self.endpoint.url(PATH);
        let body = self.body(&request);

        let response = send_with_retry(self.endpoint.max_retries, || {
            self.endpoint
                .http
                .post(&url)
                .bearer_auth(&self.endpoint.api_key)
                .json(&body)
        })
        .await?;

        Self::into_completion(decode_json(response).await?)
    }

    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client(model: &str, ceiling: u32) -> OpenAIClient {
        OpenAIClient {
            endpoint: Endpoint::fixture(model, "https://api.openai.com", ceiling),
        }
    }

    fn ask(text: &str, max_tokens: u32) -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are a strength coach".to_string(),
            messages: vec![Message::user(text)],
            max_tokens,
        }
    }

    #[test]
    fn test_system_prompt_leads_the_messages() {
        let body = client("gpt-4o", 8192).body(&ask("Is creatine safe?", 500));

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a strength coach");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Is creatine safe?");
    }

    #[test]
    fn test_reasoning_models_use_completion_token_field() {
        let body = client("o3-mini", 1000).body(&ask("Plan my week", 5000));
        assert_eq!(body["max_completion_tokens"], 1000);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_completion_maps_content_and_usage() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Drink water."}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 3, "total_tokens": 23}
        }"#;
        let reply: ChatCompletion = serde_json::from_str(json).unwrap();
        let resp = OpenAIClient::into_completion(reply).unwrap();
        assert_eq!(resp.content.as_deref(), Some("Drink water."));
        assert_eq!(resp.stop_reason, StopReason::MaxTokens);
        assert_eq!(resp.usage.input_tokens, 20);
    }

    #[test]
    fn test_completion_without_choices_is_malformed() {
        let reply: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            OpenAIClient::into_completion(reply),
            Err(LlmError::Malformed(_))
        ));
    }
}
