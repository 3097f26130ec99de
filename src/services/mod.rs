// DeepCatch Core Services

pub mod config_store;
pub mod detection;
pub mod providers;
pub mod text_processor;

pub use config_store::*;
pub use providers::*;
pub use text_processor::*;

pub use detection::{
    build_analysis_prompt,
    extract_highlight_spans,
    parse_analysis_reply,
    seed_result,
    AnalysisError,
    AnalyzerOptions,
    PhishingAnalyzer,
};
