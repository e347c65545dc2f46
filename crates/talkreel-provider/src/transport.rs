use crate::config::ProviderConfig;
use crate::error::{ProviderError, TransportError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

/// Raw answer to one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body, if the body was JSON.
    pub body: Option<Value>,
    pub text: String,
}

impl TransportResponse {
    /// Build a response from raw body text, parsing JSON when possible.
    pub fn from_text(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let body = serde_json::from_str(&text).ok();
        Self { status, body, text }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            text: body.to_string(),
            body: Some(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait abstracting provider HTTP calls for testability.
///
/// Production code uses [`ReqwestTransport`]; tests provide scripted fakes.
/// Implementations issue exactly one call per invocation and never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to `path` (relative to the provider base URL).
    async fn post_json(&self, path: &str, body: &Value) -> Result<TransportResponse, TransportError>;

    /// GET `path` (relative to the provider base URL, may carry a query).
    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError>;
}

/// HTTP transport backed by a single shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ReqwestTransport {
    /// Create a transport from configuration.
    ///
    /// Requires an API key; the per-call timeout comes from the config.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::Config("HEYGEN_API_KEY not set".to_string()))?;

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("accept", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("x-api-key", &self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<TransportResponse, TransportError> {
        let response = self.authorize(request).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok(TransportResponse::from_text(status, text))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.send(self.client.post(&url).json(body)).await
    }

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.send(self.client.get(&url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_parses_json_when_possible() {
        let response = TransportResponse::from_text(200, r#"{"video_id":"abc"}"#);
        assert!(response.is_success());
        assert_eq!(response.body, Some(json!({ "video_id": "abc" })));

        let response = TransportResponse::from_text(502, "<html>Bad Gateway</html>");
        assert!(!response.is_success());
        assert_eq!(response.body, None);
        assert_eq!(response.text, "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_transport_requires_api_key() {
        let err = ReqwestTransport::new(&ProviderConfig::new(None)).err().unwrap();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn test_url_joining() {
        let config = ProviderConfig::new(Some("sk_test_123456".to_string()))
            .with_base_url("http://localhost:8080/");
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.url("/v2/video/generate"), "http://localhost:8080/v2/video/generate");
        assert_eq!(
            transport.url("v1/video.status?video_id=a"),
            "http://localhost:8080/v1/video.status?video_id=a"
        );
    }
}
