//! Plan synthesizer: turns a transcript into a complete `BirthPlan`.
//!
//! Synthesis always succeeds. Model output is decoded strictly and merged
//! field by field over the default plan; anything unusable is replaced by
//! the default document.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::CallProfile;
use crate::error::SynthesisError;
use crate::llm::{ChatMessage, GenerationClient};

use super::model::{BirthPlan, GeneratedPlan, PlanSource};
use super::prompts::{synthesis_instruction, transcript_message};
use super::schema::{self, ADDITIONAL_NOTES_KEY};

/// Produces the plan once the parents ask for it.
#[derive(Clone)]
pub struct PlanSynthesizer {
    client: GenerationClient,
    profile: CallProfile,
}

impl PlanSynthesizer {
    pub fn new(client: GenerationClient, profile: CallProfile) -> Self {
        Self { client, profile }
    }

    /// Synthesize a plan from the full conversation history.
    ///
    /// Never fails: generation, decode and schema problems are logged and
    /// answered with the default plan.
    pub async fn synthesize(&self, history: &[ChatMessage]) -> Arc<GeneratedPlan> {
        match self.try_synthesize(history).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "Plan synthesis failed, using default plan");
                GeneratedPlan::new(
                    BirthPlan::default(),
                    PlanSource::Default {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    async fn try_synthesize(
        &self,
        history: &[ChatMessage],
    ) -> Result<Arc<GeneratedPlan>, SynthesisError> {
        let raw = self
            .client
            .invoke(
                &synthesis_instruction(),
                &[transcript_message(history)],
                &self.profile,
            )
            .await?;

        let (plan, source) = plan_from_output(&raw)?;
        match &source {
            PlanSource::Completed { filled } => info!(
                filled = filled.len(),
                "Plan synthesized, missing fields completed from defaults"
            ),
            _ => info!("Plan synthesized"),
        }
        Ok(GeneratedPlan::new(plan, source))
    }
}

/// Decode model output into a complete plan.
///
/// Fails when the output is not a JSON object or contains none of the
/// plan's sections; otherwise every missing or malformed value is taken
/// from the default plan and reported in the source.
pub fn plan_from_output(raw: &str) -> Result<(BirthPlan, PlanSource), SynthesisError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let Value::Object(generated) = value else {
        return Err(SynthesisError::NotAnObject);
    };
    let unknown = unknown_keys(&generated);
    if !unknown.is_empty() {
        debug!(keys = ?unknown, "Ignoring unknown keys in synthesized plan");
    }

    let mut merged = serde_json::to_value(BirthPlan::default())?;
    let mut filled = Vec::new();
    let mut missing_sections = Vec::new();

    for section in schema::sections() {
        let Some(generated_section) = generated.get(section.key).and_then(Value::as_object) else {
            missing_sections.push(section.key);
            filled.extend(section.fields.iter().map(|f| format!("{}.{}", section.key, f.key)));
            continue;
        };

        for field in section.fields {
            match generated_section.get(field.key).and_then(as_text) {
                Some(text) => set_field(&mut merged, section.key, field.key, text),
                None => filled.push(format!("{}.{}", section.key, field.key)),
            }
        }
    }

    if missing_sections.len() == schema::sections().len() {
        return Err(SynthesisError::MissingSections(missing_sections));
    }
    if !missing_sections.is_empty() {
        warn!(
            error = %SynthesisError::MissingSections(missing_sections),
            "Synthesized plan incomplete, filling sections from defaults"
        );
    }

    match generated.get(ADDITIONAL_NOTES_KEY).and_then(as_text) {
        Some(notes) => {
            if let Some(slot) = merged.get_mut(ADDITIONAL_NOTES_KEY) {
                *slot = Value::String(notes);
            }
        }
        None => filled.push(ADDITIONAL_NOTES_KEY.to_string()),
    }

    let plan: BirthPlan = serde_json::from_value(merged)?;
    let source = if filled.is_empty() {
        PlanSource::Generated
    } else {
        PlanSource::Completed { filled }
    };
    Ok((plan, source))
}

fn set_field(merged: &mut Value, section: &str, field: &str, text: String) {
    if let Some(slot) = merged
        .get_mut(section)
        .and_then(|s| s.get_mut(field))
    {
        *slot = Value::String(text);
    }
}

/// Render a leaf value as text. Null, empty and nested objects don't count.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) | Value::Array(_) => None,
                other => as_text(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Tolerate a single markdown code fence around the JSON.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((_lang, rest)) => rest.trim(),
        None => body.trim(),
    }
}

/// Top-level keys that match no section.
fn unknown_keys(generated: &Map<String, Value>) -> Vec<&str> {
    generated
        .keys()
        .map(String::as_str)
        .filter(|k| *k != ADDITIONAL_NOTES_KEY && schema::section(k).is_none())
        .collect()
}
