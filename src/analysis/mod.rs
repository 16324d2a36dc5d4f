//! Learning-pattern analysis
//!
//! This module turns session snapshots into a provider request, issues the
//! call, and validates the provider's untrusted text into typed results.
//!
//! Pipeline: Summaries → PromptBuilder → InferenceProvider → ResultParser → AnalysisResult

pub mod client;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod summary;
pub mod types;

pub use client::AnalysisClient;
pub use parser::ResultParser;
pub use prompt::{PromptBuilder, ACTIVITY_SYSTEM_PROMPT, ANALYSIS_SYSTEM_PROMPT};
pub use provider::{ChatRequest, InferenceProvider, OpenAiCompatibleProvider};
pub use summary::{
    ActivitySummary, AnalysisRequestPayload, InteractionSummary, PointerSample,
    MAX_POINTER_SAMPLES,
};
pub use types::{ActivityDescriptor, AnalysisResult, AreaAssessment, AreaName, StudentProfile};
