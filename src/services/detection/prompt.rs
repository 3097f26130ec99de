// Prompt Builder
// The header strings below are the wire contract with the model. The reply
// parser builds its patterns from the same constants.

pub const VERDICT_HEADER: &str = "VERDICT:";
pub const CONFIDENCE_HEADER: &str = "CONFIDENCE:";
pub const EXPLANATION_HEADER: &str = "EXPLANATION:";
pub const HIGHLIGHTED_CONTENT_HEADER: &str = "HIGHLIGHTED_CONTENT:";
pub const METADATA_HEADER: &str = "METADATA:";

pub const INPUT_TYPE_LABEL: &str = "Input Type:";
pub const SUSPICIOUS_ELEMENTS_LABEL: &str = "Suspicious Elements:";
pub const URLS_FOUND_LABEL: &str = "URLs Found:";
pub const SENDERS_DOMAINS_LABEL: &str = "Senders/Domains:";

pub const HIGH_RISK_TAG: &str = "red";
pub const MEDIUM_RISK_TAG: &str = "yellow";

pub const SYSTEM_PROMPT: &str = "You are a cybersecurity expert specializing in phishing detection. Provide detailed, accurate analysis with specific evidence.";

/// Build the user prompt. `text` is embedded verbatim so the model can quote
/// and highlight it without re-escaping.
pub fn build_analysis_prompt(text: &str) -> String {
    format!(
        r#"You are an expert cybersecurity analyst specializing in phishing detection. Analyze the following content for phishing indicators.

Content to analyze:
{text}

Please provide a comprehensive analysis with the following structure:

1. VERDICT: Classify as one of these:
   - "Safe" - legitimate content with no phishing indicators
   - "Suspicious" - contains some concerning elements but not definitively phishing
   - "High-risk" - clear phishing attempt with multiple red flags

2. CONFIDENCE: Provide a confidence score from 0-100%

3. EXPLANATION: A brief 2-3 sentence explanation of why you reached this verdict

4. HIGHLIGHTED_CONTENT: Return the original content with risky parts wrapped in tags:
   - Use <{high}>text</{high}> for high-risk elements (dangerous URLs, credential requests, etc.)
   - Use <{medium}>text</{medium}> for suspicious elements (urgency tactics, spelling errors, etc.)
   - Keep safe text unchanged

5. METADATA:
   - Input type (Email, SMS, URL, or Text)
   - Number of suspicious elements found
   - List of extracted URLs (if any)
   - List of suspicious senders/domains (if applicable)

Format your response EXACTLY as follows (use these exact section headers):
{verdict} [Safe/Suspicious/High-risk]
{confidence} [number]%
{explanation} [your explanation]
{highlighted}
[content with <{high}> and <{medium}> tags]
{metadata}
{input_type} [type]
{suspicious} [number]
{urls} [list or "None"]
{senders} [list or "None"]"#,
        text = text,
        high = HIGH_RISK_TAG,
        medium = MEDIUM_RISK_TAG,
        verdict = VERDICT_HEADER,
        confidence = CONFIDENCE_HEADER,
        explanation = EXPLANATION_HEADER,
        highlighted = HIGHLIGHTED_CONTENT_HEADER,
        metadata = METADATA_HEADER,
        input_type = INPUT_TYPE_LABEL,
        suspicious = SUSPICIOUS_ELEMENTS_LABEL,
        urls = URLS_FOUND_LABEL,
        senders = SENDERS_DOMAINS_LABEL,
    )
}
