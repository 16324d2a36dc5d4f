//! LearnPulse - Activity telemetry recorder and learning-pattern analysis client
//!
//! LearnPulse records a learner's behavioral telemetry during a timed activity
//! and turns it, plus derived metrics, into a structured diagnostic assessment
//! produced by an external inference provider:
//! raw events → session recorder → metrics → prompt → provider → validated result.
//!
//! ## Modules
//!
//! - **Session**: Record one activity session and derive metrics from it
//! - **Analysis**: Build provider prompts, call the provider, validate its replies

pub mod analysis;
pub mod config;
pub mod error;
pub mod session;

pub use analysis::{AnalysisClient, AnalysisResult, InferenceProvider, PromptBuilder, ResultParser};
pub use config::{AnalysisConfig, ProviderConfig};
pub use error::{AnalysisError, ConfigError, ProviderError, ReplayError, SessionError};
pub use session::{compute_metrics, ActivityMetrics, ActivitySession, InteractionEvent, SessionRecorder};

/// LearnPulse version
pub const LEARNPULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "learnpulse";
