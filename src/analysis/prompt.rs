//! Prompt construction
//!
//! Pure functions turning activity and interaction snapshots into provider
//! instructions. Output depends only on the input values: struct fields
//! serialize in declaration order and maps are `BTreeMap`s, so the same input
//! always produces a byte-identical prompt.

use serde::Serialize;

use crate::analysis::types::{AnalysisResult, StudentProfile};
use crate::error::AnalysisError;

/// System framing for learning-pattern analysis
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert educational psychologist specializing in detecting specific learning disabilities in early childhood education.";

/// System framing for personalized activity generation
pub const ACTIVITY_SYSTEM_PROMPT: &str = "You are an expert in creating personalized learning activities for children with specific learning disabilities.";

/// Builder for analysis and activity-generation prompts
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the learning-pattern analysis prompt.
    ///
    /// Inputs containing `HashMap`s serialize in unspecified key order and
    /// lose the determinism guarantee; use typed summaries or `BTreeMap`s.
    pub fn analysis_prompt<A, I>(activity: &A, interaction: &I) -> Result<String, AnalysisError>
    where
        A: Serialize + ?Sized,
        I: Serialize + ?Sized,
    {
        let activity_json = serde_json::to_string_pretty(activity)?;
        let interaction_json = serde_json::to_string_pretty(interaction)?;

        Ok(format!(
            "Please analyze the following learning data for potential specific learning disabilities.\n\
             \n\
             Activity Results:\n\
             {activity_json}\n\
             \n\
             Interaction Data:\n\
             {interaction_json}\n\
             \n\
             Please provide a detailed analysis including:\n\
             1. Presence of potential SLD indicators\n\
             2. Confidence level in the assessment\n\
             3. Specific areas of concern (reading, writing, math, attention)\n\
             4. Recommendations for support and intervention\n\
             \n\
             {ANALYSIS_RESPONSE_FORMAT}"
        ))
    }

    /// Build the personalized activity prompt
    pub fn activity_prompt(
        profile: &StudentProfile,
        previous_analysis: &AnalysisResult,
    ) -> Result<String, AnalysisError> {
        let profile_json = serde_json::to_string_pretty(profile)?;
        let analysis_json = serde_json::to_string_pretty(previous_analysis)?;

        Ok(format!(
            "Please generate a personalized learning activity based on:\n\
             \n\
             Student Profile:\n\
             {profile_json}\n\
             \n\
             Previous Analysis:\n\
             {analysis_json}\n\
             \n\
             Generate an activity that:\n\
             1. Addresses the identified areas of concern\n\
             2. Builds on the student's strengths\n\
             3. Incorporates appropriate accommodations\n\
             4. Is engaging and age-appropriate\n\
             \n\
             {ACTIVITY_RESPONSE_FORMAT}"
        ))
    }
}

const ANALYSIS_RESPONSE_FORMAT: &str = r#"Respond with a single JSON object and nothing else, using exactly this shape:
{
  "potentialSLD": boolean,
  "confidence": number between 0 and 1,
  "areas": {
    "<area>": { "score": number between 0 and 1, "concerns": [string] }
  },
  "recommendations": [string]
}
Valid area names are "reading", "writing", "math" and "attention"; include only the areas you assessed."#;

const ACTIVITY_RESPONSE_FORMAT: &str = r#"Respond with a single JSON object and nothing else, using this shape:
{
  "title": string,
  "description": string,
  "target_areas": ["reading" | "writing" | "math" | "attention"],
  "instructions": [string],
  "accommodations": [string],
  "estimated_minutes": integer
}"#;
