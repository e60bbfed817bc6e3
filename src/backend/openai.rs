//! OpenAI-compatible API client
//!
//! Implements both [`GenerationClient`] (`/chat/completions`) and
//! [`ImageClient`] (`/images/generations`) against any endpoint that speaks
//! the OpenAI wire format.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::{CompletionRequest, GenerationClient, ImageClient, ImageRequest};

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key. Empty means no credentials.
    pub api_key: String,

    /// Chat model
    pub model: String,

    /// Image model
    pub image_model: String,

    /// Image size, e.g. "1024x1024"
    pub image_size: String,

    /// Image quality, "standard" or "hd"
    pub image_quality: String,

    /// Per-request timeout for image generation in seconds
    pub image_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            image_timeout_secs: 120,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// OpenAI Client
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Usage {
    completions: u64,
    images: u64,
    total_tokens: u64,
}

/// OpenAI-compatible client for text and image generation
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
    usage: RwLock<Usage>,
}

impl OpenAiClient {
    /// Create a new client with the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "OpenAI-compatible client created"
        );

        Ok(Self {
            config,
            client,
            usage: RwLock::new(Usage::default()),
        })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Completed (text, image) requests so far
    pub fn request_counts(&self) -> (u64, u64) {
        let usage = self.usage.read();
        (usage.completions, usage.images)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        let key = self.config.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", key))
        }
    }

    /// Map a non-success status to a typed error
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = truncate(&body, 300);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::AuthenticationFailed { message },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn has_credentials(&self) -> bool {
        self.auth_header().is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = self.endpoint("chat/completions");
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref auth) = self.auth_header() {
            req = req.header("Authorization", auth);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::network(&url, e.to_string()))?;
        let response = Self::check_status(response).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("Failed to decode completion response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::parse("Completion response contained no content"))?;

        let mut usage = self.usage.write();
        usage.completions += 1;
        if let Some(u) = parsed.usage {
            usage.total_tokens += u.total_tokens as u64;
        }
        debug!(chars = text.len(), "Completion received");

        Ok(text)
    }
}

#[async_trait]
impl ImageClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<String> {
        let persona_id = Some(request.persona_id.as_str());
        let url = self.endpoint("images/generations");
        let body = ImageGenerationRequest {
            model: &self.config.image_model,
            prompt: &request.prompt,
            n: 1,
            size: &self.config.image_size,
            quality: &self.config.image_quality,
        };

        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.image_timeout_secs))
            .json(&body);
        if let Some(ref auth) = self.auth_header() {
            req = req.header("Authorization", auth);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::image(persona_id, format!("request failed: {}", e)))?;
        let response = Self::check_status(response)
            .await
            .map_err(|e| Error::image(persona_id, e.to_string()))?;

        let parsed: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| Error::image(persona_id, format!("malformed response: {}", e)))?;

        let image_url = parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::image(persona_id, "response did not include an image URL"))?;

        self.usage.write().images += 1;
        Ok(image_url)
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.image_model, "dall-e-3");
        assert_eq!(config.image_timeout_secs, 120);
    }

    #[test]
    fn test_auth_header() {
        let config = OpenAiConfig {
            api_key: "sk-test-123".to_string(),
            ..Default::default()
        };
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.auth_header(), Some("Bearer sk-test-123".to_string()));
        assert!(client.has_credentials());

        let no_key = OpenAiClient::new(OpenAiConfig {
            api_key: "   ".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(no_key.auth_header(), None);
        assert!(!no_key.has_credentials());
    }

    #[test]
    fn test_endpoint_join() {
        let client = OpenAiClient::new(OpenAiConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(client.request_counts(), (0, 0));
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "usr" },
            ],
            max_tokens: 2000,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 2000);
    }

    #[test]
    fn test_image_response_without_url() {
        let parsed: ImageGenerationResponse =
            serde_json::from_str(r#"{"data":[{"revised_prompt":"x"}]}"#).unwrap();
        assert!(parsed.data.into_iter().find_map(|d| d.url).is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  short ", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
