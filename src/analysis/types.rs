//! Analysis data types
//!
//! Typed inputs to and outputs from the inference provider.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Learning area assessed by the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaName {
    Reading,
    Writing,
    Math,
    Attention,
}

impl AreaName {
    pub const ALL: [AreaName; 4] = [
        AreaName::Reading,
        AreaName::Writing,
        AreaName::Math,
        AreaName::Attention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaName::Reading => "reading",
            AreaName::Writing => "writing",
            AreaName::Math => "math",
            AreaName::Attention => "attention",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|area| area.as_str() == name)
    }
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assessment of a single learning area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaAssessment {
    score: f64,
    concerns: Vec<String>,
}

impl AreaAssessment {
    pub(crate) fn new(score: f64, concerns: Vec<String>) -> Self {
        Self { score, concerns }
    }

    /// Area score (0-1)
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn concerns(&self) -> &[String] {
        &self.concerns
    }
}

/// Structured diagnostic result decoded from provider output.
///
/// Only the result parser constructs this type, after validating every field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "potentialSLD")]
    potential_sld: bool,
    confidence: f64,
    areas: BTreeMap<AreaName, AreaAssessment>,
    recommendations: Vec<String>,
}

impl AnalysisResult {
    pub(crate) fn new(
        potential_sld: bool,
        confidence: f64,
        areas: BTreeMap<AreaName, AreaAssessment>,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            potential_sld,
            confidence,
            areas,
            recommendations,
        }
    }

    /// Whether the provider flagged potential specific learning disability indicators
    pub fn potential_sld(&self) -> bool {
        self.potential_sld
    }

    /// Confidence in the assessment (0-1)
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn areas(&self) -> &BTreeMap<AreaName, AreaAssessment> {
        &self.areas
    }

    pub fn area(&self, name: AreaName) -> Option<&AreaAssessment> {
        self.areas.get(&name)
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }
}

/// Learner profile used to personalize generated activities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Accommodations already in place for the learner
    #[serde(default)]
    pub accommodations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A generated, personalized learning activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDescriptor {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_areas: Vec<AreaName>,
    pub instructions: Vec<String>,
    pub accommodations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    /// Any additional fields the provider returned, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
