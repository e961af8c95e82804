//! Client for the text-completion endpoint.
//!
//! The HTTP exchange sits behind [`CompletionTransport`]; [`GenerationClient`]
//! owns request shaping, the timeout, cancellation and response parsing.

use crate::{
    config::{ANTHROPIC_VERSION, Config},
    error::{Error, Result},
    prompt::GenerationRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Body of a messages request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagesRequest {
    /// Model identifier
    pub model: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Conversation; always a single user message here
    pub messages: Vec<Message>,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Speaker role
    pub role: String,

    /// Message text
    pub content: String,
}

impl MessagesRequest {
    /// Creates a request carrying one user message.
    #[must_use]
    pub fn user(model: impl Into<String>, max_tokens: u32, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.into(),
            }],
        }
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Option<Vec<ContentBlock>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Generated article text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Plain text assembled from the response's text blocks
    pub text: String,

    /// When the response was received
    pub generated_at: DateTime<Local>,
}

impl GenerationResult {
    /// Wraps text received now.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: Local::now(),
        }
    }
}

/// Sends one request to the completion service.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Performs the exchange and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if no response was received.
    async fn send(&self, request: &MessagesRequest) -> Result<RawResponse>;
}

/// [`CompletionTransport`] over HTTPS using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Creates an authenticated transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key)
                .map_err(|e| Error::config(format!("Invalid API key header: {e}")))?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(&self, request: &MessagesRequest) -> Result<RawResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Turns prompts into generated text.
pub struct GenerationClient {
    transport: Arc<dyn CompletionTransport>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl GenerationClient {
    /// Creates a client talking HTTP to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Creates a client over any transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn CompletionTransport>, config: &Config) -> Self {
        Self {
            transport,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        }
    }

    /// Sends the request and extracts the article text.
    ///
    /// Fails with [`Error::Timeout`] if the configured timeout elapses and
    /// with [`Error::Cancelled`] if `cancel` fires first. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns a generation failure ([`Error::is_generation_failure`]).
    #[instrument(skip_all, fields(model = %self.model, tokens = request.estimated_tokens))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let body = MessagesRequest::user(&self.model, self.max_tokens, &request.prompt);

        info!("Sending generation request");
        let call = tokio::time::timeout(self.timeout, self.transport.send(&body));

        let raw = tokio::select! {
            () = cancel.cancelled() => {
                warn!("Generation cancelled");
                return Err(Error::Cancelled);
            }
            res = call => res.map_err(|_| Error::Timeout { secs: self.timeout.as_secs() })??,
        };

        debug!("Received HTTP {} ({} bytes)", raw.status, raw.body.len());
        let result = parse_response(&raw)?;
        info!("Generated {} characters", result.text.chars().count());
        Ok(result)
    }
}

/// Extracts the article text from a raw response.
///
/// Text blocks are joined with `\n` in order; other block types are dropped.
///
/// # Errors
///
/// Returns [`Error::Service`] with the service's message if the body carries
/// an error payload, [`Error::Transport`] for non-JSON error statuses, and
/// [`Error::InvalidResponse`] for anything else that cannot be read.
pub fn parse_response(raw: &RawResponse) -> Result<GenerationResult> {
    let success = (200..300).contains(&raw.status);

    let parsed: MessagesResponse = match serde_json::from_str(&raw.body) {
        Ok(parsed) => parsed,
        Err(e) if success => {
            return Err(Error::InvalidResponse {
                message: e.to_string(),
            });
        }
        Err(_) => {
            return Err(Error::transport(format!(
                "HTTP {}: {}",
                raw.status,
                raw.body.chars().take(200).collect::<String>()
            )));
        }
    };

    if let Some(error) = parsed.error {
        return Err(Error::service(error.message));
    }

    let blocks = parsed.content.ok_or_else(|| Error::InvalidResponse {
        message: format!("HTTP {}: response has no content", raw.status),
    })?;

    let text = blocks
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text.unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(GenerationResult::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::Tone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTransport {
        response: RawResponse,
        delay: Option<Duration>,
        calls: AtomicUsize,
        last_request: std::sync::Mutex<Option<MessagesRequest>>,
    }

    impl FakeTransport {
        fn ok(body: &str) -> Self {
            Self {
                response: RawResponse {
                    status: 200,
                    body: body.to_string(),
                },
                delay: None,
                calls: AtomicUsize::new(0),
                last_request: std::sync::Mutex::new(None),
            }
        }

        fn slow(body: &str, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::ok(body)
            }
        }
    }

    #[async_trait]
    impl CompletionTransport for FakeTransport {
        async fn send(&self, request: &MessagesRequest) -> Result<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.response.clone())
        }
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            tone: Tone::Casual,
            title_hint: None,
            reference_count: 1,
            has_primary: false,
            estimated_tokens: 1,
        }
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest::user("model-x", 4096, "hello");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "model-x",
                "max_tokens": 4096,
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn test_text_blocks_joined_in_order() {
        let body = r#"{"content":[
            {"type":"text","text":"A"},
            {"type":"image","source":{"type":"base64","data":""}},
            {"type":"text","text":"B"}
        ]}"#;

        let result = parse_response(&raw(200, body)).unwrap();
        assert_eq!(result.text, "A\nB");
    }

    #[test]
    fn test_service_error_message_verbatim() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"rate limited"}}"#;

        let err = parse_response(&raw(429, body)).unwrap_err();
        assert!(matches!(err, Error::Service { .. }));
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_error_payload_wins_even_on_200() {
        let err = parse_response(&raw(200, r#"{"error":{"message":"overloaded"}}"#)).unwrap_err();
        assert_eq!(err.to_string(), "overloaded");
    }

    #[test]
    fn test_missing_content_is_invalid() {
        let err = parse_response(&raw(200, r#"{"id":"msg_1"}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse { .. }));
    }

    #[test]
    fn test_non_json_success_is_invalid() {
        let err = parse_response(&raw(200, "not json")).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse { .. }));
    }

    #[test]
    fn test_non_json_error_status_is_transport() {
        let err = parse_response(&raw(502, "<html>Bad Gateway</html>")).unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_no_text_blocks_gives_empty_text() {
        let result = parse_response(&raw(200, r#"{"content":[{"type":"tool_use","id":"x"}]}"#)).unwrap();
        assert_eq!(result.text, "");
    }

    #[tokio::test]
    async fn test_generate_sends_one_user_message() {
        let transport = Arc::new(FakeTransport::ok(r#"{"content":[{"type":"text","text":"Article"}]}"#));
        let config = Config::builder().model("model-y").max_tokens(100).build().unwrap();
        let client = GenerationClient::with_transport(transport.clone(), &config);

        let result = client
            .generate(&request("the prompt"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.text, "Article");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let sent = transport.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent, MessagesRequest::user("model-y", 100, "the prompt"));
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let transport = Arc::new(FakeTransport::slow("{}", Duration::from_secs(5)));
        let config = Config::builder()
            .timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let client = GenerationClient::with_transport(transport, &config);

        let err = client
            .generate(&request("p"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_generate_cancelled() {
        let transport = Arc::new(FakeTransport::slow("{}", Duration::from_secs(5)));
        let config = Config::builder().build().unwrap();
        let client = GenerationClient::with_transport(transport, &config);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.generate(&request("p"), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_http_transport_requires_key() {
        let config = Config::builder().build().unwrap();
        assert!(HttpTransport::new(&config).unwrap_err().is_config());
    }
}
