//! Inference provider boundary
//!
//! The analysis client depends only on [`InferenceProvider`]: send a
//! chat-style request, receive text. [`OpenAiCompatibleProvider`] implements it
//! over any `/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// A single chat-style request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Capability to run a chat request against an external model
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Send the request and return the model's raw text reply
    async fn send_chat_request(&self, request: ChatRequest) -> Result<String, ProviderError>;
}

// ============================================================================
// OpenAI-compatible HTTP provider
// ============================================================================

/// Provider for any OpenAI-compatible chat completions API
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Self {
        Self::with_client(Client::new(), api_key, base_url)
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, pooling)
    pub fn with_client(client: Client, api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.api_key.clone(), &config.base_url)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<CompletionChoice>>,
    error: Option<CompletionError>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessageResponse,
}

#[derive(Deserialize)]
struct CompletionMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionError {
    message: String,
}

fn completion_body(request: &ChatRequest) -> CompletionRequest<'_> {
    CompletionRequest {
        model: &request.model,
        messages: [
            CompletionMessage {
                role: "system",
                content: &request.system_prompt,
            },
            CompletionMessage {
                role: "user",
                content: &request.user_prompt,
            },
        ],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

/// Pull the first choice's text out of a decoded completion response
fn extract_content(response: CompletionResponse) -> Result<String, ProviderError> {
    if let Some(error) = response.error {
        return Err(ProviderError::Api(error.message));
    }

    response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

#[async_trait]
impl InferenceProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn send_chat_request(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let start = Instant::now();
        debug!(
            model = %request.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&completion_body(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let decoded = response.json::<CompletionResponse>().await?;
        let content = extract_content(decoded)?;
        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "chat request complete"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer exactly one HTTP request with the given status line and body.
    /// Returns the base URL to point the provider at.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/v1")
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    fn local_provider(base_url: &str) -> OpenAiCompatibleProvider {
        let client = Client::builder().no_proxy().build().unwrap();
        OpenAiCompatibleProvider::with_client(client, "sk-test", base_url)
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.5,
            max_tokens: 1000,
        }
    }

    #[test]
    fn test_completion_body_shape() {
        let body = serde_json::to_value(completion_body(&request())).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4",
                "messages": [
                    { "role": "system", "content": "system" },
                    { "role": "user", "content": "user" }
                ],
                "temperature": 0.5,
                "max_tokens": 1000
            })
        );
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let provider = OpenAiCompatibleProvider::new("key", "https://api.example.com/v1/");
        assert_eq!(provider.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_extract_content() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"ok\":true}" } }]
        }))
        .unwrap();
        assert_eq!(extract_content(response).unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn test_extract_content_errors() {
        let api_error: CompletionResponse =
            serde_json::from_value(json!({ "error": { "message": "quota exceeded" } })).unwrap();
        assert!(matches!(
            extract_content(api_error),
            Err(ProviderError::Api(msg)) if msg == "quota exceeded"
        ));

        let empty: CompletionResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(extract_content(empty), Err(ProviderError::EmptyResponse)));

        let blank: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "  " } }]
        }))
        .unwrap();
        assert!(matches!(extract_content(blank), Err(ProviderError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let base_url = serve_once("503 Service Unavailable", "upstream down").await;

        let result = local_provider(&base_url).send_chat_request(request()).await;
        match result {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_with_non_json_body_is_http_error() {
        let base_url = serve_once("200 OK", "<html>gateway</html>").await;

        let result = local_provider(&base_url).send_chat_request(request()).await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }

    #[tokio::test]
    async fn test_success_returns_first_choice() {
        let base_url = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"potentialSLD\":false}"}}]}"#,
        )
        .await;

        let content = local_provider(&base_url)
            .send_chat_request(request())
            .await
            .unwrap();
        assert_eq!(content, r#"{"potentialSLD":false}"#);
    }
}
