//! Provider response parsing
//!
//! Provider text is untrusted. Every field is checked for presence, type and
//! range before a result is constructed; any failure rejects the whole
//! response so downstream code never sees a half-populated diagnostic.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

use crate::analysis::types::{ActivityDescriptor, AnalysisResult, AreaAssessment, AreaName};
use crate::error::AnalysisError;

/// Validating parser for provider responses
pub struct ResultParser;

impl ResultParser {
    /// Parse and validate an analysis response
    pub fn parse(raw: &str) -> Result<AnalysisResult, AnalysisError> {
        let result = parse_analysis(raw);
        if let Err(e) = &result {
            warn!(error = %e, "rejected analysis response");
        }
        result
    }

    /// Parse and validate a generated activity response
    pub fn parse_activity(raw: &str) -> Result<ActivityDescriptor, AnalysisError> {
        let result = parse_activity(raw);
        if let Err(e) = &result {
            warn!(error = %e, "rejected activity response");
        }
        result
    }
}

fn malformed(message: impl Into<String>) -> AnalysisError {
    AnalysisError::Malformed(message.into())
}

fn parse_analysis(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let mut object = parse_object(raw)?;

    let potential_sld = match object.remove("potentialSLD") {
        Some(Value::Bool(flag)) => flag,
        Some(_) => return Err(malformed("potentialSLD must be a boolean")),
        None => return Err(malformed("missing required field potentialSLD")),
    };

    let confidence = unit_interval(
        object
            .get("confidence")
            .ok_or_else(|| malformed("missing required field confidence"))?,
        "confidence",
    )?;

    let areas = match object.get("areas") {
        Some(Value::Object(areas)) => parse_areas(areas)?,
        Some(_) => return Err(malformed("areas must be an object")),
        None => return Err(malformed("missing required field areas")),
    };

    let recommendations = string_array(
        object
            .get("recommendations")
            .ok_or_else(|| malformed("missing required field recommendations"))?,
        "recommendations",
    )?;

    Ok(AnalysisResult::new(
        potential_sld,
        confidence,
        areas,
        recommendations,
    ))
}

fn parse_areas(areas: &Map<String, Value>) -> Result<BTreeMap<AreaName, AreaAssessment>, AnalysisError> {
    let mut parsed = BTreeMap::new();
    for (name, value) in areas {
        let area = AreaName::from_name(name)
            .ok_or_else(|| malformed(format!("unknown area {name:?}")))?;

        let Value::Object(fields) = value else {
            return Err(malformed(format!("areas.{name} must be an object")));
        };

        let score = unit_interval(
            fields
                .get("score")
                .ok_or_else(|| malformed(format!("missing areas.{name}.score")))?,
            &format!("areas.{name}.score"),
        )?;
        let concerns = string_array(
            fields
                .get("concerns")
                .ok_or_else(|| malformed(format!("missing areas.{name}.concerns")))?,
            &format!("areas.{name}.concerns"),
        )?;

        parsed.insert(area, AreaAssessment::new(score, concerns));
    }
    Ok(parsed)
}

fn parse_activity(raw: &str) -> Result<ActivityDescriptor, AnalysisError> {
    let mut object = parse_object(raw)?;

    let title = match object.remove("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => title,
        Some(_) => return Err(malformed("title must be a non-empty string")),
        None => return Err(malformed("missing required field title")),
    };

    let instructions = string_array(
        &object
            .remove("instructions")
            .ok_or_else(|| malformed("missing required field instructions"))?,
        "instructions",
    )?;
    if instructions.is_empty() {
        return Err(malformed("instructions must not be empty"));
    }

    let description = match object.remove("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(_) => return Err(malformed("description must be a string")),
    };

    let target_areas = match object.remove("target_areas") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => string_array(&value, "target_areas")?
            .iter()
            .map(|name| {
                AreaName::from_name(name)
                    .ok_or_else(|| malformed(format!("unknown target area {name:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let accommodations = match object.remove("accommodations") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => string_array(&value, "accommodations")?,
    };

    let estimated_minutes = match object.remove("estimated_minutes") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_u64()
                .and_then(|m| u32::try_from(m).ok())
                .ok_or_else(|| malformed("estimated_minutes must be a non-negative integer"))?,
        ),
    };

    Ok(ActivityDescriptor {
        title,
        description,
        target_areas,
        instructions,
        accommodations,
        estimated_minutes,
        extra: object,
    })
}

/// Decode `raw` as a JSON object, tolerating one surrounding markdown fence
fn parse_object(raw: &str) -> Result<Map<String, Value>, AnalysisError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(malformed("response is empty"));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(malformed("response is not a JSON object")),
        Err(e) => Err(malformed(format!("response is not valid JSON: {e}"))),
    }
}

/// Strip a single ```` ```lang ... ``` ```` wrapper, if present
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening line
    match inner.split_once('\n') {
        Some((info, body)) if !info.contains('{') => body.trim(),
        _ => inner.trim(),
    }
}

fn unit_interval(value: &Value, field: &str) -> Result<f64, AnalysisError> {
    let number = value
        .as_f64()
        .ok_or_else(|| malformed(format!("{field} must be a number")))?;
    if !number.is_finite() || !(0.0..=1.0).contains(&number) {
        return Err(malformed(format!("{field} must be within [0, 1], got {number}")));
    }
    Ok(number)
}

fn string_array(value: &Value, field: &str) -> Result<Vec<String>, AnalysisError> {
    let Value::Array(items) = value else {
        return Err(malformed(format!("{field} must be an array of strings")));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("{field} must contain only strings")))
        })
        .collect()
}
