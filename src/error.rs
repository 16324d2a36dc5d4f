//! Error types for LearnPulse

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the session recorder on lifecycle misuse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session; call start() first")]
    NoActiveSession,

    #[error("A session is already open; end() or reset() it before starting another")]
    AlreadyOpen,

    #[error("Invalid answer record: {0}")]
    InvalidAnswer(String),
}

/// Failures reported by an inference provider transport
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider error: {0}")]
    Api(String),

    #[error("Provider returned no content")]
    EmptyResponse,
}

/// Errors surfaced by the analysis client
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis service error: {0}")]
    Service(#[from] ProviderError),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed analysis response: {0}")]
    Malformed(String),

    #[error("Failed to encode analysis input: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Errors loading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Errors replaying a recorded session script
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to parse line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Line {line}: {source}")]
    Session {
        line: usize,
        #[source]
        source: SessionError,
    },

    #[error("Script ended without closing the session")]
    Unterminated,
}
