// Highlight span extraction
// Reads the <red>/<yellow> markup the model wraps around risky spans

use regex::Regex;
use std::sync::OnceLock;

use super::prompt::{HIGH_RISK_TAG, MEDIUM_RISK_TAG};
use crate::models::{HighlightSeverity, HighlightSpan};

fn span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?is)<{high}>(.*?)</{high}>|<{medium}>(.*?)</{medium}>",
            high = HIGH_RISK_TAG,
            medium = MEDIUM_RISK_TAG
        );
        Regex::new(&pattern).expect("highlight regex")
    })
}

/// Marked spans in order of appearance. Unterminated tags are ignored.
pub fn extract_highlight_spans(content: &str) -> Vec<HighlightSpan> {
    span_re()
        .captures_iter(content)
        .filter_map(|caps| {
            if let Some(m) = caps.get(1) {
                Some(HighlightSpan {
                    severity: HighlightSeverity::High,
                    text: m.as_str().to_string(),
                })
            } else {
                caps.get(2).map(|m| HighlightSpan {
                    severity: HighlightSeverity::Medium,
                    text: m.as_str().to_string(),
                })
            }
        })
        .collect()
}
