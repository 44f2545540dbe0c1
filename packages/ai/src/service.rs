// ABOUTME: AI service for making structured generation calls to the Anthropic Messages API
// ABOUTME: Handles API requests, code-fence stripping and JSON parsing of the answer

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f32 = 0.0;
const REQUEST_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum AIServiceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Invalid response format")]
    InvalidResponse,
}

pub type AIServiceResult<T> = Result<T, AIServiceError>;

/// Connection settings for the Anthropic API
#[derive(Debug, Clone)]
pub struct AIConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug)]
pub struct AIResponse<T> {
    pub data: T,
    pub usage: Usage,
}

/// Client for structured JSON generation
pub struct AIService {
    client: Client,
    config: AIConfig,
}

impl AIService {
    fn create_client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            })
    }

    pub fn new(config: AIConfig) -> Self {
        if config.api_key.is_none() {
            info!("ANTHROPIC_API_KEY not set - AI generation endpoints are disabled");
        }
        if config.model != DEFAULT_MODEL {
            info!("Using custom Anthropic model: {}", config.model);
        }

        Self {
            client: Self::create_client(),
            config,
        }
    }

    /// Service pointed at the public API with the default model
    pub fn with_api_key(api_key: String) -> Self {
        Self::new(AIConfig {
            api_key: Some(api_key),
            ..Default::default()
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Makes a structured generation call.
    /// The prompt should ask for JSON only; the answer is parsed into `T`.
    pub async fn generate_structured<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: String,
        system_prompt: Option<String>,
    ) -> AIServiceResult<AIResponse<T>> {
        let api_key = self.config.api_key.as_ref().ok_or(AIServiceError::NoApiKey)?;

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            system: system_prompt,
        };

        info!(
            "Making Anthropic API request: model={}, max_tokens={}",
            request.model, request.max_tokens
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Anthropic API request timed out after {}s", REQUEST_TIMEOUT_SECS);
                } else {
                    error!("Anthropic API request failed: {}", e);
                }
                AIServiceError::RequestFailed(e)
            })?;

        let status = response.status();
        debug!("Received response from Anthropic API: status={}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Anthropic API error: {} - {}", status, error_text);
            return Err(AIServiceError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AIServiceError::ParseError(e.to_string()))?;

        let text = anthropic_response
            .content
            .iter()
            .find_map(|block| block.text.as_deref())
            .ok_or(AIServiceError::InvalidResponse)?;

        let json_text = strip_code_fences(text);
        let data: T = serde_json::from_str(json_text).map_err(|e| {
            error!(
                "JSON parsing failed: {}. JSON snippet: {}",
                e,
                json_text.chars().take(500).collect::<String>()
            );
            AIServiceError::ParseError(format!("Failed to parse JSON: {}", e))
        })?;

        Ok(AIResponse {
            data,
            usage: anthropic_response.usage,
        })
    }
}

/// Remove a surrounding markdown fence (```json ... ```) if present
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let start = trimmed.find('\n').map(|i| i + 1).unwrap_or(trimmed.len());
    let body = &trimmed[start..];
    let end = body.rfind("```").unwrap_or(body.len());
    body[..end].trim()
}
