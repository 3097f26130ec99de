// AI Provider Service
// OpenAI-compatible chat completions client (DeepSeek by default)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::config_store::{AppConfig, ProviderConfig};

pub const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_PROVIDER: &str = "deepseek";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured. Set DEEPSEEK_API_KEY or store a key in the config file")]
    MissingApiKey,
}

impl ProviderError {
    /// Configuration problems do not go away by calling again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::MissingApiKey => false,
            ProviderError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

/// The remote model seen from the analyzer: one system + user turn in,
/// one reply text out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short identifier used in logs, e.g. `deepseek:deepseek-chat`.
    fn describe(&self) -> String;

    async fn complete(&self, system: &str, user: &str) -> Result<ChatResult, ProviderError>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

pub struct ProviderClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    max_tokens: u32,
}

impl ProviderClient {
    pub fn new(provider: &ProviderConfig, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(provider.http_timeout_secs))
            .build()
            .unwrap_or_default();

        let url = env::var("DEEPSEEK_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| provider.base_url.clone())
            .unwrap_or_else(|| DEEPSEEK_DEFAULT_URL.to_string());

        Self {
            client,
            url,
            model: provider.model.clone(),
            api_key,
            temperature: provider.temperature,
            max_tokens: provider.max_tokens,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.provider, get_api_key(config, DEFAULT_PROVIDER))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call_chat_api(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult {
            content,
            latency_ms,
        })
    }
}

#[async_trait]
impl ChatBackend for ProviderClient {
    fn describe(&self) -> String {
        format!("{}:{}", DEFAULT_PROVIDER, self.model)
    }

    async fn complete(&self, system: &str, user: &str) -> Result<ChatResult, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        self.call_chat_api(api_key, system, user).await
    }
}

/// Get API key from environment or the loaded config
pub fn get_api_key(config: &AppConfig, provider: &str) -> Option<String> {
    let env_keys = match provider {
        "deepseek" => vec!["DEEPSEEK_API_KEY", "DEEPCATCH_DEEPSEEK_API_KEY"],
        _ => vec![],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    config
        .api_keys
        .get(provider)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
