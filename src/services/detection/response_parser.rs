// Response Parser
// Turns the model's header-formatted reply into an AnalysisResult.
//
// Every field is located by its own pattern search, so sections may be
// missing, reordered or repeated. The first match per field wins and a
// field that cannot be read keeps its seeded default. Parsing never fails.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::prompt::{
    CONFIDENCE_HEADER, EXPLANATION_HEADER, HIGHLIGHTED_CONTENT_HEADER, INPUT_TYPE_LABEL,
    METADATA_HEADER, SENDERS_DOMAINS_LABEL, SUSPICIOUS_ELEMENTS_LABEL, URLS_FOUND_LABEL,
    VERDICT_HEADER,
};
use crate::models::{AnalysisMetadata, AnalysisResult, Verdict};
use crate::services::text_processor::{detect_input_type, extract_urls};

pub const DEFAULT_CONFIDENCE: u32 = 50;
pub const DEFAULT_EXPLANATION: &str = "Analysis completed";

// ============================================================================
// Patterns (built from the prompt constants so both sides change together)
// ============================================================================

fn compile(pattern: String, name: &str) -> Regex {
    Regex::new(&pattern).unwrap_or_else(|e| panic!("{} regex: {}", name, e))
}

fn label(header: &str) -> String {
    format!(r"(?i){}", regex::escape(header))
}

fn verdict_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(format!(r"{}\s*(\w+(?:-\w+)?)", label(VERDICT_HEADER)), "verdict"))
}

fn confidence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(format!(r"{}\s*([0-9]+)%?", label(CONFIDENCE_HEADER)), "confidence"))
}

fn explanation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(label(EXPLANATION_HEADER), "explanation"))
}

fn explanation_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(
            format!(
                r"(?i){}|{}",
                regex::escape(HIGHLIGHTED_CONTENT_HEADER),
                regex::escape(METADATA_HEADER)
            ),
            "explanation end",
        )
    })
}

fn highlighted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(label(HIGHLIGHTED_CONTENT_HEADER), "highlighted"))
}

fn metadata_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(label(METADATA_HEADER), "metadata"))
}

fn input_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(format!(r"{}[ \t]*([^\r\n]+)", label(INPUT_TYPE_LABEL)), "input type"))
}

fn suspicious_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(format!(r"{}\s*([0-9]+)", label(SUSPICIOUS_ELEMENTS_LABEL)), "suspicious elements")
    })
}

fn urls_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(format!(r"{}[ \t]*", label(URLS_FOUND_LABEL)), "urls found"))
}

fn senders_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(format!(r"{}[ \t]*", label(SENDERS_DOMAINS_LABEL)), "senders"))
}

/// A line that looks like `Some Label:` (colon followed by whitespace or end
/// of line), or a blank line. `https://` does not qualify.
fn list_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(
            r"(?m)^[ \t]*(?:[A-Za-z][A-Za-z0-9 /_-]*:(?:[ \t]|\r|$)|\r?$)".to_string(),
            "list end",
        )
    })
}

// ============================================================================
// Seeding
// ============================================================================

/// Defaults computed from the request text alone.
pub fn seed_result(text: &str, analysis_time: f64) -> AnalysisResult {
    AnalysisResult {
        verdict: Verdict::Safe.as_str().to_string(),
        confidence: DEFAULT_CONFIDENCE,
        explanation: DEFAULT_EXPLANATION.to_string(),
        highlighted_content: text.to_string(),
        metadata: AnalysisMetadata {
            input_type: detect_input_type(text).as_str().to_string(),
            suspicious_elements: 0,
            urls_found: extract_urls(text),
            senders_domains: Vec::new(),
            analysis_time,
        },
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a model reply over defaults seeded from `text`.
pub fn parse_analysis_reply(reply: &str, text: &str, analysis_time: f64) -> AnalysisResult {
    let mut result = seed_result(text, analysis_time);
    let matched = apply_reply(&mut result, reply);
    debug!(
        "[PARSER] reply_chars={} fields_matched={:?}",
        reply.chars().count(),
        matched
    );
    result
}

/// Overwrite fields of `result` with whatever `reply` provides. Returns the
/// names of the fields that were taken from the reply.
pub fn apply_reply(result: &mut AnalysisResult, reply: &str) -> Vec<&'static str> {
    let mut matched = Vec::new();

    if let Some(caps) = verdict_re().captures(reply) {
        result.verdict = caps[1].to_string();
        matched.push("verdict");
    }

    if let Some(value) = confidence_re()
        .captures(reply)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        result.confidence = value;
        matched.push("confidence");
    }

    if let Some(value) = capture_section(reply, explanation_re(), explanation_end_re()) {
        result.explanation = value.to_string();
        matched.push("explanation");
    }

    if let Some(value) = capture_section(reply, highlighted_re(), metadata_re()) {
        result.highlighted_content = value.to_string();
        matched.push("highlighted_content");
    }

    if let Some(region) = metadata_re().find(reply).map(|m| &reply[m.end()..]) {
        apply_metadata(&mut result.metadata, region, &mut matched);
    }

    matched
}

fn apply_metadata(metadata: &mut AnalysisMetadata, region: &str, matched: &mut Vec<&'static str>) {
    if let Some(value) = input_type_re()
        .captures(region)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
    {
        metadata.input_type = value.to_string();
        matched.push("input_type");
    }

    if let Some(value) = suspicious_re()
        .captures(region)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        metadata.suspicious_elements = value;
        matched.push("suspicious_elements");
    }

    if let Some(block) = value_after(region, urls_re()).and_then(capture_list_block) {
        metadata.urls_found = parse_list(block);
        matched.push("urls_found");
    }

    if let Some(value) = value_after(region, senders_re()).and_then(capture_single_line_list) {
        metadata.senders_domains = parse_list(value);
        matched.push("senders_domains");
    }
}

/// Text between `label` and the first `end` match (or end of reply), trimmed.
fn capture_section<'a>(reply: &'a str, label: &Regex, end: &Regex) -> Option<&'a str> {
    let start = label.find(reply)?.end();
    let rest = &reply[start..];
    let stop = end.find(rest).map_or(rest.len(), |m| m.start());
    let value = rest[..stop].trim();
    (!value.is_empty()).then_some(value)
}

/// Remainder after a label pattern, starting on the label's own line.
fn value_after<'a>(region: &'a str, label: &Regex) -> Option<&'a str> {
    let rest = &region[label.find(region)?.end()..];
    (!rest.is_empty()).then_some(rest)
}

fn split_first_line(rest: &str) -> (&str, Option<&str>) {
    match rest.find('\n') {
        Some(nl) => (&rest[..nl], Some(&rest[nl + 1..])),
        None => (rest, None),
    }
}

/// Lines of `tail` up to the next header-looking or blank line.
fn continuation(tail: &str) -> &str {
    let stop = list_end_re().find(tail).map_or(tail.len(), |m| m.start());
    &tail[..stop]
}

fn non_blank(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

/// The value's first line plus any continuation lines. A label alone on its
/// line takes the lines below it; a header right below it means no value.
fn capture_list_block(rest: &str) -> Option<&str> {
    let (first, tail) = split_first_line(rest);
    if first.trim().is_empty() {
        return non_blank(continuation(tail?));
    }
    match tail {
        Some(tail) => Some(&rest[..first.len() + 1 + continuation(tail).len()]),
        None => Some(rest),
    }
}

/// Same-line value only, unless the label stands alone on its line.
fn capture_single_line_list(rest: &str) -> Option<&str> {
    let (first, tail) = split_first_line(rest);
    if first.trim().is_empty() {
        return non_blank(continuation(tail?));
    }
    Some(first)
}

fn strip_wrapping(value: &str) -> &str {
    let value = value.trim();
    let value = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    value.trim().trim_matches(|c: char| c == '"' || c == '\'').trim()
}

/// Comma/line separated list. A bare `none` (any case) means an empty list.
fn parse_list(value: &str) -> Vec<String> {
    let value = strip_wrapping(value);
    if value.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    value
        .split(|c: char| c == ',' || c == '\n')
        .map(|token| {
            token
                .trim()
                .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
                .trim()
                .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
                .trim()
        })
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str = "VERDICT: Safe\nCONFIDENCE: 95%\nEXPLANATION: No risk indicators.\nHIGHLIGHTED_CONTENT:\nHello team\nMETADATA:\nInput Type: Email\nSuspicious Elements: 0\nURLs Found: None\nSenders/Domains: None";

    #[test]
    fn test_scenario_a_canonical_reply() {
        let result = parse_analysis_reply(SCENARIO_A, "Hello team", 1.5);
        assert_eq!(result.verdict, "Safe");
        assert_eq!(result.confidence, 95);
        assert_eq!(result.explanation, "No risk indicators.");
        assert_eq!(result.highlighted_content, "Hello team");
        assert_eq!(result.metadata.input_type, "Email");
        assert_eq!(result.metadata.suspicious_elements, 0);
        assert!(result.metadata.urls_found.is_empty());
        assert!(result.metadata.senders_domains.is_empty());
        assert_eq!(result.metadata.analysis_time, 1.5);
    }

    #[test]
    fn test_scenario_b_missing_highlight_and_metadata() {
        let text = "Your account is locked, visit https://secure-bank.example/login";
        let reply = "VERDICT: High-risk\nCONFIDENCE: 92%\nEXPLANATION: Credential harvesting link.";
        let result = parse_analysis_reply(reply, text, 0.4);
        assert_eq!(result.verdict, "High-risk");
        assert_eq!(result.confidence, 92);
        assert_eq!(result.explanation, "Credential harvesting link.");
        assert_eq!(result.highlighted_content, text);
        assert_eq!(result.metadata, seed_result(text, 0.4).metadata);
    }

    #[test]
    fn test_empty_reply_yields_seeded_defaults() {
        let text = "Dear friend, see http://x.example";
        let result = parse_analysis_reply("", text, 2.0);
        assert_eq!(result, seed_result(text, 2.0));
        assert_eq!(result.verdict, "Safe");
        assert_eq!(result.confidence, 50);
        assert_eq!(result.explanation, "Analysis completed");
        assert_eq!(result.metadata.input_type, "URL/Link");
        assert_eq!(result.metadata.urls_found, vec!["http://x.example".to_string()]);
    }

    #[test]
    fn test_unstructured_reply_yields_seeded_defaults() {
        let text = "hello";
        let reply = "I think this message is probably fine, nothing stands out.";
        assert_eq!(parse_analysis_reply(reply, text, 0.0), seed_result(text, 0.0));
    }

    #[test]
    fn test_confidence_only_reply() {
        let text = "Click here to reply";
        let result = parse_analysis_reply("CONFIDENCE: 87%", text, 0.3);
        let mut expected = seed_result(text, 0.3);
        expected.confidence = 87;
        assert_eq!(result, expected);
    }

    #[test]
    fn test_confidence_is_not_clamped_by_parser() {
        let result = parse_analysis_reply("CONFIDENCE: 150", "x", 0.0);
        assert_eq!(result.confidence, 150);
    }

    #[test]
    fn test_overflowing_confidence_keeps_default() {
        let result = parse_analysis_reply("CONFIDENCE: 99999999999999999999%", "x", 0.0);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_verdict_is_kept_verbatim() {
        let result = parse_analysis_reply("verdict: probably-fine", "x", 0.0);
        assert_eq!(result.verdict, "probably-fine");
        let result = parse_analysis_reply("VERDICT: Unclear\n", "x", 0.0);
        assert_eq!(result.verdict, "Unclear");
    }

    #[test]
    fn test_verdict_skips_template_echo() {
        let reply = "VERDICT: [Safe/Suspicious/High-risk]\n...\nVERDICT: Suspicious";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(result.verdict, "Suspicious");
    }

    #[test]
    fn test_first_match_wins_on_duplicates() {
        let reply = "VERDICT: Suspicious\nCONFIDENCE: 60%\nVERDICT: Safe\nCONFIDENCE: 10%";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(result.verdict, "Suspicious");
        assert_eq!(result.confidence, 60);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let reply = "verdict: suspicious\nconfidence: 40\nexplanation: odd sender\nmetadata:\ninput type: SMS";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(result.verdict, "suspicious");
        assert_eq!(result.confidence, 40);
        assert_eq!(result.explanation, "odd sender");
        assert_eq!(result.metadata.input_type, "SMS");
    }

    #[test]
    fn test_multiline_explanation_stops_at_metadata() {
        let reply = "EXPLANATION: Line one.\nLine two.\n\nMETADATA:\nSuspicious Elements: 3";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(result.explanation, "Line one.\nLine two.");
        assert_eq!(result.metadata.suspicious_elements, 3);
        assert_eq!(result.highlighted_content, "x");
    }

    #[test]
    fn test_empty_sections_keep_defaults() {
        let reply = "EXPLANATION:   \nHIGHLIGHTED_CONTENT:\n\nMETADATA:\nInput Type:   \n";
        let result = parse_analysis_reply(reply, "Dear Bob", 0.0);
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
        assert_eq!(result.highlighted_content, "Dear Bob");
        assert_eq!(result.metadata.input_type, "Email");
    }

    #[test]
    fn test_urls_none_overrides_local_extraction() {
        let text = "Go to http://a.example and https://b.example";
        for none in ["None", "NONE", "none", "\"None\"", "[None]"] {
            let reply = format!("METADATA:\nURLs Found: {}\n", none);
            let result = parse_analysis_reply(&reply, text, 0.0);
            assert!(result.metadata.urls_found.is_empty(), "{}", none);
        }
    }

    #[test]
    fn test_urls_list_is_split_and_trimmed() {
        let reply = "METADATA:\nURLs Found: http://a.example/x ,  https://b.example ,, \nSenders/Domains: evil.example, support@evil.example";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(
            result.metadata.urls_found,
            vec!["http://a.example/x".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(
            result.metadata.senders_domains,
            vec!["evil.example".to_string(), "support@evil.example".to_string()]
        );
    }

    #[test]
    fn test_urls_bulleted_list_over_several_lines() {
        let reply = "METADATA:\nURLs Found:\n- http://a.example\n- http://b.example\nSenders/Domains: None";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(
            result.metadata.urls_found,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
        assert!(result.metadata.senders_domains.is_empty());
    }

    #[test]
    fn test_metadata_order_tolerance() {
        let canonical = "VERDICT: Suspicious\nMETADATA:\nInput Type: SMS\nSuspicious Elements: 2\nURLs Found: http://a.example, http://b.example\nSenders/Domains: a.example";
        let swapped = "VERDICT: Suspicious\nMETADATA:\nSenders/Domains: a.example\nURLs Found: http://a.example, http://b.example\nSuspicious Elements: 2\nInput Type: SMS";
        let a = parse_analysis_reply(canonical, "msg", 0.0);
        let b = parse_analysis_reply(swapped, "msg", 0.0);
        assert_eq!(a, b);
        assert_eq!(a.metadata.suspicious_elements, 2);
        assert_eq!(a.metadata.urls_found.len(), 2);
    }

    #[test]
    fn test_metadata_fields_outside_region_are_ignored() {
        let reply = "Input Type: Email\nURLs Found: None\nVERDICT: Safe";
        let text = "see http://a.example";
        let result = parse_analysis_reply(reply, text, 0.0);
        assert_eq!(result.metadata.input_type, "URL/Link");
        assert_eq!(result.metadata.urls_found, vec!["http://a.example".to_string()]);
    }

    #[test]
    fn test_sections_in_any_order() {
        let reply = "METADATA:\nSuspicious Elements: 4\nHIGHLIGHTED_CONTENT: <red>bad</red>\nEXPLANATION: Because.\nVERDICT: High-risk\nCONFIDENCE: 80";
        let result = parse_analysis_reply(reply, "bad", 0.0);
        assert_eq!(result.verdict, "High-risk");
        assert_eq!(result.confidence, 80);
        assert_eq!(result.explanation, "Because.\nVERDICT: High-risk\nCONFIDENCE: 80");
        assert_eq!(result.metadata.suspicious_elements, 4);
    }

    #[test]
    fn test_list_end_ignores_url_schemes() {
        let block = capture_list_block("http://a.example\nhttps://b.example\nSenders/Domains: x");
        assert_eq!(block, Some("http://a.example\nhttps://b.example\n"));
    }

    #[test]
    fn test_empty_url_value_does_not_swallow_next_header() {
        let reply = "METADATA:\nURLs Found:\nSenders/Domains: evil.example";
        let result = parse_analysis_reply(reply, "see http://a.example", 0.0);
        assert_eq!(result.metadata.urls_found, vec!["http://a.example".to_string()]);
        assert_eq!(result.metadata.senders_domains, vec!["evil.example".to_string()]);
    }

    #[test]
    fn test_empty_senders_value_does_not_swallow_next_header() {
        let reply = "METADATA:\nSenders/Domains:\nInput Type: SMS\nURLs Found: None";
        let result = parse_analysis_reply(reply, "msg", 0.0);
        assert!(result.metadata.senders_domains.is_empty());
        assert_eq!(result.metadata.input_type, "SMS");
        assert!(result.metadata.urls_found.is_empty());

        let last = parse_analysis_reply("METADATA:\nInput Type: SMS\nURLs Found: None\nSenders/Domains:", "msg", 0.0);
        assert_eq!(last.metadata, result.metadata);
    }

    #[test]
    fn test_senders_bulleted_below_label() {
        let reply = "METADATA:\nSenders/Domains:\n- evil.example\n- support@evil.example\n\nThanks";
        let result = parse_analysis_reply(reply, "x", 0.0);
        assert_eq!(
            result.metadata.senders_domains,
            vec!["evil.example".to_string(), "support@evil.example".to_string()]
        );
    }
}
