// Phishing Analyzer
// Validates the request, calls the remote model once (or a bounded number of
// times when retries are configured) and parses the reply.

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn, Instrument};

use super::prompt::{build_analysis_prompt, SYSTEM_PROMPT};
use super::response_parser::parse_analysis_reply;
use crate::models::AnalysisResult;
use crate::services::config_store::{AnalysisConfig, AppConfig};
use crate::services::providers::{ChatBackend, ChatResult, ProviderClient, ProviderError};
use crate::services::text_processor::preview;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Text cannot be empty")]
    EmptyInput,
    #[error("Analysis failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("Analysis timed out after {0}s")]
    Timeout(u64),
}

impl AnalysisError {
    /// HTTP-style status for an embedding web layer.
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::EmptyInput => 400,
            AnalysisError::Provider(_) | AnalysisError::Timeout(_) => 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalyzerOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Shared, read-only handle created once at startup.
#[derive(Clone)]
pub struct PhishingAnalyzer {
    backend: Arc<dyn ChatBackend>,
    options: AnalyzerOptions,
}

impl PhishingAnalyzer {
    pub fn new(backend: Arc<dyn ChatBackend>, options: AnalyzerOptions) -> Self {
        Self { backend, options }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = ProviderClient::from_config(config);
        if client.has_api_key() {
            info!("[ANALYZER] Remote client ready: {} ({})", client.describe(), client.url());
        } else {
            warn!("[ANALYZER] DEEPSEEK_API_KEY not found; analysis requests will fail until a key is configured");
        }
        Self::new(Arc::new(client), AnalyzerOptions::from(&config.analysis))
    }

    /// Run the full pipeline for one request.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let text = validate_input(text)?;
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("analysis", %request_id);

        async move {
            info!(
                "[ANALYZER] Processing text with {}: {}",
                self.backend.describe(),
                preview(text, 50)
            );

            let prompt = build_analysis_prompt(text);
            let started = Instant::now();
            let reply = self.complete_with_retry(&prompt).await?;
            let analysis_time = round_secs(started.elapsed());

            let result = parse_analysis_reply(&reply.content, text, analysis_time);
            info!(
                verdict = %result.verdict,
                confidence = result.confidence,
                latency_ms = reply.latency_ms,
                analysis_time,
                "[ANALYZER] Analysis completed: {} ({}%)",
                result.verdict,
                result.confidence
            );
            Ok::<_, AnalysisError>(result)
        }
        .instrument(span)
        .await
    }

    async fn complete_with_retry(&self, prompt: &str) -> Result<ChatResult, AnalysisError> {
        let timeout_secs = self.options.request_timeout.as_secs();
        let mut attempt: u32 = 1;

        loop {
            let fut = self.backend.complete(SYSTEM_PROMPT, prompt);
            let err = match tokio::time::timeout(self.options.request_timeout, fut).await {
                Ok(Ok(reply)) => {
                    if attempt > 1 {
                        info!("[ANALYZER] Remote call succeeded on attempt {}", attempt);
                    }
                    return Ok(reply);
                }
                Ok(Err(e)) => {
                    warn!("[ANALYZER] Remote call error attempt={} : {}", attempt, e);
                    let retryable = e.is_retryable();
                    let err = AnalysisError::Provider(e);
                    if !retryable {
                        return Err(err);
                    }
                    err
                }
                Err(_) => {
                    warn!("[ANALYZER] Remote call timeout attempt={} ({}s)", attempt, timeout_secs);
                    AnalysisError::Timeout(timeout_secs)
                }
            };

            if attempt >= self.options.max_attempts {
                return Err(err);
            }

            tokio::time::sleep(self.options.retry_backoff * attempt).await;
            attempt += 1;
        }
    }
}

/// Trimmed request text, or `EmptyInput` when nothing is left.
pub fn validate_input(text: &str) -> Result<&str, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(trimmed)
}

/// Seconds rounded to two decimals.
fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
