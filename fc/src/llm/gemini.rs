//! Google Gemini API client implementation
//!
//! Implements the LlmClient trait for the `generateContent` endpoint of the
//! Generative Language API. Gemini calls the assistant role `model` and takes
//! the system prompt as a separate `system_instruction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{Endpoint, decode_json, send_with_retry};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Role, StopReason, TokenUsage};
use crate::config::LlmConfig;

pub struct GeminiClient {
    endpoint: Endpoint,
}

impl GeminiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    fn url(&self) -> String {
        self.endpoint
            .url(&format!("/v1beta/models/{}:generateContent", self.endpoint.model))
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        let system_instruction = (!request.system_prompt.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(request.system_prompt.clone()),
            }],
        });

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                max_output_tokens: self.endpoint.token_budget(request.max_tokens),
            },
        }
    }

    /// Parse the Gemini API response
    fn parse_response(&self, api_response: GeminiResponse) -> Result<CompletionResponse, LlmError> {
        if let Some(error) = api_response.error {
            return Err(LlmError::Malformed(error.message));
        }

        let candidate = api_response
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| LlmError::Malformed("response has no candidates".to_string()))?;
        debug!(finish_reason = ?candidate.finish_reason, "parse_response: called");

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let usage = api_response.usage_metadata.unwrap_or_default();
        Ok(CompletionResponse {
            content: if text.is_empty() { None } else { Some(text) },
            stop_reason: StopReason::from_gemini(candidate.finish_reason.as_deref().unwrap_or("STOP")),
            usage: TokenUsage {
                input_tokens: usage.prompt,
                output_tokens: usage.candidates,
            },
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, turns = request.messages.len(), "GeminiClient::complete: called");
        let url = self.url();
        let body = self.build_request_body(&request);

        let response = send_with_retry(self.endpoint.max_retries, || {
            self.endpoint
                .http
                .post(&url)
                .header("x-goog-api-key", &self.endpoint.api_key)
                .json(&body)
        })
        .await?;

        self.parse_response(decode_json(response).await?)
    }

    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates: u64,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client() -> GeminiClient {
        GeminiClient {
            endpoint: Endpoint::fixture("gemini-2.5-flash", "https://generativelanguage.googleapis.com", 8192),
        }
    }

    #[test]
    fn test_url() {
        assert_eq!(
            client().url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_body_maps_roles() {
        let request = CompletionRequest {
            system_prompt: "You are a coach".to_string(),
            messages: vec![Message::user("Hi"), Message::assistant("Hello"), Message::user("Stretch?")],
            max_tokens: 500,
        };

        let body = serde_json::to_value(client().build_request_body(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "Stretch?");
        assert_eq!(body["system_instruction"]["parts"][0]["text"], "You are a coach");
        assert!(body["system_instruction"].get("role").is_none());
        assert_eq!(body["generation_config"]["max_output_tokens"], 500);
    }

    #[test]
    fn test_empty_system_prompt_omitted() {
        let request = CompletionRequest {
            system_prompt: String::new(),
            messages: vec![Message::user("Hi")],
            max_tokens: 100_000,
        };
        let body = serde_json::to_value(client().build_request_body(&request)).unwrap();
        assert!(body.get("system_instruction").is_none());
        assert_eq!(body["generation_config"]["max_output_tokens"], 8192);
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Day 1: Squats"}, {"text": "\nDay 2: Rest"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 30, "candidatesTokenCount": 9, "totalTokenCount": 39}
        }"#;
        let api: GeminiResponse = serde_json::from_str(json).unwrap();
        let resp = client().parse_response(api).unwrap();
        assert_eq!(resp.content.as_deref(), Some("Day 1: Squats\nDay 2: Rest"));
        assert_eq!(resp.usage.total(), 39);
    }

    #[test]
    fn test_parse_blocked_response_has_no_content() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let api: GeminiResponse = serde_json::from_str(json).unwrap();
        let resp = client().parse_response(api).unwrap();
        assert!(resp.content.is_none());
        assert_eq!(resp.stop_reason, StopReason::Safety);
    }

    #[test]
    fn test_parse_error_body() {
        let api: GeminiResponse = serde_json::from_str(r#"{"error": {"code": 400, "message": "bad key"}}"#).unwrap();
        assert!(matches!(client().parse_response(api), Err(LlmError::Malformed(m)) if m == "bad key"));
    }
}
