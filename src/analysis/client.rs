//! Analysis client
//!
//! Orchestrates one provider round trip: build the prompt, send it under a
//! timeout, and validate the reply. No call is retried; retry policy belongs
//! to the caller.
//!
//! Pipeline: snapshot → PromptBuilder → InferenceProvider → ResultParser → typed result

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::parser::ResultParser;
use crate::analysis::prompt::{PromptBuilder, ACTIVITY_SYSTEM_PROMPT, ANALYSIS_SYSTEM_PROMPT};
use crate::analysis::provider::{ChatRequest, InferenceProvider};
use crate::analysis::summary::AnalysisRequestPayload;
use crate::analysis::types::{ActivityDescriptor, AnalysisResult, StudentProfile};
use crate::config::{AnalysisConfig, SamplingParams};
use crate::error::AnalysisError;
use crate::session::metrics::compute_metrics;
use crate::session::types::ActivitySession;

/// Client for learning-pattern analysis and activity generation
pub struct AnalysisClient {
    provider: Arc<dyn InferenceProvider>,
    config: AnalysisConfig,
}

impl AnalysisClient {
    /// Create a client with default model, timeout and sampling parameters
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self::with_config(provider, AnalysisConfig::default())
    }

    pub fn with_config(provider: Arc<dyn InferenceProvider>, config: AnalysisConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze activity results and interaction data for potential SLD indicators
    pub async fn analyze<A, I>(
        &self,
        activity: &A,
        interaction: &I,
    ) -> Result<AnalysisResult, AnalysisError>
    where
        A: Serialize + ?Sized,
        I: Serialize + ?Sized,
    {
        let user_prompt = PromptBuilder::analysis_prompt(activity, interaction)?;
        let text = self
            .send(ANALYSIS_SYSTEM_PROMPT, user_prompt, self.config.analysis)
            .await?;
        ResultParser::parse(&text)
    }

    /// Capture snapshots from a sealed session and analyze them
    pub async fn analyze_session(
        &self,
        session: &ActivitySession,
    ) -> Result<AnalysisResult, AnalysisError> {
        let metrics = compute_metrics(session);
        let payload = AnalysisRequestPayload::from_session(session, &metrics);
        self.analyze(&payload.activity_results, &payload.interaction_data)
            .await
    }

    /// Generate an activity tailored to the learner and a previous analysis
    pub async fn generate_activity(
        &self,
        profile: &StudentProfile,
        previous_analysis: &AnalysisResult,
    ) -> Result<ActivityDescriptor, AnalysisError> {
        let user_prompt = PromptBuilder::activity_prompt(profile, previous_analysis)?;
        let text = self
            .send(ACTIVITY_SYSTEM_PROMPT, user_prompt, self.config.activity)
            .await?;
        ResultParser::parse_activity(&text)
    }

    async fn send(
        &self,
        system_prompt: &str,
        user_prompt: String,
        params: SamplingParams,
    ) -> Result<String, AnalysisError> {
        let request = ChatRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt,
            model: self.config.model.clone(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        debug!(
            provider = self.provider.name(),
            model = %request.model,
            "dispatching analysis request"
        );

        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.provider.send_chat_request(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "provider call failed");
                Err(AnalysisError::Service(e))
            }
            Err(_) => {
                warn!(provider = self.provider.name(), ?timeout, "provider call timed out");
                Err(AnalysisError::Timeout(timeout))
            }
        }
    }
}
