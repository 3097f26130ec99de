// Text Processing Service
// Local heuristics that seed analysis defaults before the model replies

use regex::Regex;
use std::sync::OnceLock;

use crate::models::InputType;

const EMAIL_MARKERS: [&str; 6] = ["subject:", "from:", "to:", "dear", "regards", "sincerely"];
const SMS_MARKERS: [&str; 4] = ["click", "reply", "text", "msg"];
const SMS_MAX_CHARS: usize = 200;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `$-_` is a range: it covers `/:?=#%` and friends, which is what lets
        // paths and query strings through.
        Regex::new(r"https?://(?:[a-zA-Z0-9]|[$-_@.&+]|[!*\\(),]|%[0-9a-fA-F]{2})+")
            .expect("url regex")
    })
}

/// Extract every http/https URL in order of appearance (duplicates kept).
pub fn extract_urls(text: &str) -> Vec<String> {
    url_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Classify the input with cheap heuristics. First match wins.
pub fn detect_input_type(text: &str) -> InputType {
    let lower = text.to_lowercase();

    if lower.contains("http://") || lower.contains("https://") {
        return InputType::Url;
    }

    if EMAIL_MARKERS.iter().any(|m| lower.contains(m)) {
        return InputType::Email;
    }

    if text.chars().count() < SMS_MAX_CHARS && SMS_MARKERS.iter().any(|m| lower.contains(m)) {
        return InputType::Sms;
    }

    InputType::Text
}

/// Single-line, length-bounded preview for log lines.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}
