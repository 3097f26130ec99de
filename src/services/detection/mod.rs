// Detection Module
// Phishing analysis core organized into specialized submodules:
// - prompt: Builds the instruction prompt and owns the reply header contract
// - response_parser: Parses the model reply over locally seeded defaults
// - highlight: Reads <red>/<yellow> spans out of highlighted content
// - analyzer: Validates input, calls the remote model, times the call

pub mod analyzer;
pub mod highlight;
pub mod prompt;
pub mod response_parser;

// Re-export commonly used functions
pub use analyzer::{validate_input, AnalysisError, AnalyzerOptions, PhishingAnalyzer};
pub use highlight::extract_highlight_spans;
pub use prompt::{build_analysis_prompt, SYSTEM_PROMPT};
pub use response_parser::{apply_reply, parse_analysis_reply, seed_result};
