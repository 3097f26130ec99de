// DeepCatch Data Models
// Request/response envelopes shared by the analyzer, the api boundary and the CLI

use serde::{Deserialize, Serialize};

// ============ Analysis Request ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: String,
}

// ============ Verdict ============

/// Closed verdict set used by classification consumers.
///
/// The parser keeps whatever token the model emitted; this enum is the
/// best-effort projection of that token.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Safe,
    Suspicious,
    #[serde(rename = "High-risk")]
    HighRisk,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Safe => "Safe",
            Verdict::Suspicious => "Suspicious",
            Verdict::HighRisk => "High-risk",
        }
    }

    /// Case-insensitive recognition of a verdict label. Returns `None` for
    /// tokens that do not name one of the three verdicts or a known synonym.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "safe" | "legitimate" | "benign" | "clean" => Some(Verdict::Safe),
            "suspicious" | "questionable" | "caution" | "medium" | "mediumrisk" => {
                Some(Verdict::Suspicious)
            }
            "highrisk" | "high" | "dangerous" | "malicious" | "phishing" | "scam" => {
                Some(Verdict::HighRisk)
            }
            _ => None,
        }
    }

    /// Total mapping onto the closed set. Unknown labels land on
    /// `Suspicious` so an unreadable verdict is never reported as safe.
    pub fn classify(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Verdict::Suspicious)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Input Type ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InputType {
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "SMS/Text Message")]
    Sms,
    #[serde(rename = "URL/Link")]
    Url,
    #[serde(rename = "Text/Message")]
    Text,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Email => "Email",
            InputType::Sms => "SMS/Text Message",
            InputType::Url => "URL/Link",
            InputType::Text => "Text/Message",
        }
    }

    /// Best-effort mapping of a free-form label such as "SMS" or "url".
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if lower.is_empty() {
            None
        } else if lower.contains("email") || lower.contains("e-mail") {
            Some(InputType::Email)
        } else if lower.contains("sms") {
            Some(InputType::Sms)
        } else if lower.contains("url") || lower.contains("link") {
            Some(InputType::Url)
        } else if lower.contains("text") || lower.contains("message") {
            Some(InputType::Text)
        } else {
            None
        }
    }
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Highlighting ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightSeverity {
    /// `<red>` spans: dangerous URLs, credential requests
    High,
    /// `<yellow>` spans: urgency, spelling, tone
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighlightSpan {
    pub severity: HighlightSeverity,
    pub text: String,
}

// ============ Analysis Result ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisMetadata {
    pub input_type: String,
    pub suspicious_elements: u32,
    #[serde(default)]
    pub urls_found: Vec<String>,
    #[serde(default)]
    pub senders_domains: Vec<String>,
    /// Seconds spent in the remote call, measured locally.
    pub analysis_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    /// Verbatim verdict token from the model (or the seeded default).
    pub verdict: String,
    pub confidence: u32,
    pub explanation: String,
    pub highlighted_content: String,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn verdict_class(&self) -> Verdict {
        Verdict::classify(&self.verdict)
    }

    /// `None` when the model wrote a label outside the four known types.
    pub fn input_type_class(&self) -> Option<InputType> {
        InputType::from_label(&self.metadata.input_type)
    }

    pub fn highlight_spans(&self) -> Vec<HighlightSpan> {
        crate::services::detection::extract_highlight_spans(&self.highlighted_content)
    }

    /// Presentation-boundary view: confidence clamped to [0, 100].
    pub fn normalized(mut self) -> Self {
        self.confidence = self.confidence.min(100);
        self
    }
}
