//! The `LlmClient` seam plus the HTTP plumbing every provider shares

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmError};
use crate::config::LlmConfig;

const FIRST_BACKOFF: Duration = Duration::from_secs(1);

/// Used when a 429 arrives without a usable `retry-after`
const DEFAULT_THROTTLE_WAIT: Duration = Duration::from_secs(60);

/// One completion call per request; the caller owns the conversation
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Provider name, for logs and `fc status`
    fn provider(&self) -> &str;

    fn model(&self) -> &str;
}

/// Connection settings resolved from [`LlmConfig`] for a single provider
pub(crate) struct Endpoint {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub http: Client,
    /// Extra attempts on transient failure, from `max-retries`
    pub max_retries: u32,
    max_tokens: u32,
}

impl Endpoint {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, model = %config.model, "Endpoint::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Setup(e.to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url(),
            http,
            max_retries: config.max_retries,
            max_tokens: config.max_tokens,
        })
    }

    /// The request's token budget, never above the configured ceiling
    pub fn token_budget(&self, requested: u32) -> u32 {
        requested.min(self.max_tokens)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[cfg(test)]
    pub fn fixture(model: &str, base_url: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            http: Client::new(),
            max_retries: 0,
            max_tokens,
        }
    }
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s...
fn backoff(attempt: u32) -> Duration {
    FIRST_BACKOFF * 2u32.pow(attempt.saturating_sub(1))
}

/// Turn a non-success response into an error
async fn failure_from(response: Response) -> LlmError {
    let code = response.status().as_u16();
    if code == 429 {
        let wait = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_THROTTLE_WAIT);
        return LlmError::Throttled { wait };
    }
    let body = response.text().await.unwrap_or_default();
    LlmError::Status { code, body }
}

/// Send a request, retrying transient failures up to `max_retries` times
///
/// With `max_retries == 0` the first failure is returned as is. `build` runs
/// once per attempt because `send` consumes the builder. Throttling is never
/// retried: the caller gets `Throttled` and the provider's suggested wait.
pub(crate) async fn send_with_retry<F>(max_retries: u32, build: F) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let failure = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => failure_from(response).await,
            Err(e) => LlmError::Transport(e),
        };

        let throttled = matches!(failure, LlmError::Throttled { .. });
        if throttled || !failure.is_transient() || attempt >= max_retries {
            debug!(attempt, error = %failure, "send_with_retry: giving up");
            return Err(failure);
        }

        attempt += 1;
        let delay = backoff(attempt);
        warn!(attempt, delay_ms = delay.as_millis() as u64, error = %failure, "send_with_retry: transient failure");
        tokio::time::sleep(delay).await;
    }
}

/// Read the whole body and decode it as `T`
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
    let text = response.text().await?;
    debug!(bytes = text.len(), "decode_json: called");
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned responses in order and records what it was sent
    pub struct MockLlmClient {
        responses: Mutex<std::collections::VecDeque<CompletionResponse>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Malformed("mock has no responses left".to_string()))
        }

        fn provider(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn request() -> CompletionRequest {
            CompletionRequest {
                system_prompt: "Coach".to_string(),
                messages: vec![],
                max_tokens: 1000,
            }
        }

        #[tokio::test]
        async fn test_mock_replays_in_order_then_errors() {
            let client = MockLlmClient::new(vec![
                CompletionResponse::text("Day 1: Squats"),
                CompletionResponse::text("Day 1: Run"),
            ]);

            let first = client.complete(request()).await.unwrap();
            assert_eq!(first.content.as_deref(), Some("Day 1: Squats"));
            let second = client.complete(request()).await.unwrap();
            assert_eq!(second.content.as_deref(), Some("Day 1: Run"));
            assert!(client.complete(request()).await.is_err());
            assert_eq!(client.call_count(), 3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local server answering every request with `status`; returns its URL and a request counter
    async fn serve_status(status: u16) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = format!("HTTP/1.1 {status} Oops\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbusy");
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (url, hits)
    }

    #[tokio::test]
    async fn test_server_error_is_sent_once_by_default() {
        let (url, hits) = serve_status(503).await;
        let http = Client::new();

        let err = send_with_retry(0, || http.get(&url)).await.unwrap_err();

        assert!(matches!(err, LlmError::Status { code: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_configured_retry_resends_server_error() {
        let (url, hits) = serve_status(502).await;
        let http = Client::new();

        let err = send_with_retry(1, || http.get(&url)).await.unwrap_err();

        assert!(matches!(err, LlmError::Status { code: 502, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_never_retried() {
        let (url, hits) = serve_status(400).await;
        let http = Client::new();

        let err = send_with_retry(3, || http.get(&url)).await.unwrap_err();

        assert!(matches!(err, LlmError::Status { code: 400, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn test_token_budget_is_capped() {
        let endpoint = Endpoint::fixture("m", "https://example.test", 1000);
        assert_eq!(endpoint.token_budget(400), 400);
        assert_eq!(endpoint.token_budget(5000), 1000);
        assert_eq!(endpoint.url("/v1/messages"), "https://example.test/v1/messages");
    }
}
