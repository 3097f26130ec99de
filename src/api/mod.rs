// Request boundary
// What an embedding web layer calls: request in, normalized result or
// `{detail}` error out.

use serde::Serialize;
use tracing::{error, info};

use crate::models::{AnalysisResult, AnalyzeRequest, ErrorResponse};
use crate::services::detection::{AnalysisError, PhishingAnalyzer};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(flatten)]
    pub body: ErrorResponse,
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let detail = match &err {
            AnalysisError::EmptyInput => err.to_string(),
            _ => format!("Prediction failed: {}", err),
        };
        Self {
            status: err.status_code(),
            body: ErrorResponse { detail },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.body.detail)
    }
}

impl std::error::Error for ApiError {}

/// Analyze one request. Confidence is clamped here; the verdict keeps the
/// model's wording (use `AnalysisResult::verdict_class` for the closed set).
pub async fn check_text(
    analyzer: &PhishingAnalyzer,
    request: AnalyzeRequest,
) -> Result<AnalysisResult, ApiError> {
    match analyzer.analyze(&request.text).await {
        Ok(result) => {
            let result = result.normalized();
            info!(
                "[API] Result: {} ({}%) class={}",
                result.verdict,
                result.confidence,
                result.verdict_class()
            );
            Ok(result)
        }
        Err(AnalysisError::EmptyInput) => Err(ApiError::from(AnalysisError::EmptyInput)),
        Err(e) => {
            error!("[API] Error during prediction: {}", e);
            Err(ApiError::from(e))
        }
    }
}
