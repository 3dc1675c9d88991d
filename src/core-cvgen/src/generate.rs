//! Generation phase: turn a scraped posting and an optional profile into application material.

use async_trait::async_trait;
use data_model_cvgen::models::{GeneratedContent, JobPosting, UserProfile};
use serde::Deserialize;
use serde_json::Value;

use crate::GenerationError;
use crate::llms::LlmProvider;
use crate::llms::prompts::{EMPTY_PROFILE, prompt_generate_application};

/// Everything the generator is given for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub job_posting: JobPosting,
    pub user_profile: Option<UserProfile>,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, input: &GenerationInput) -> Result<GeneratedContent, GenerationError>;
}

/// Generates content by prompting an LLM once and validating its JSON answer.
pub struct LlmTextGenerator<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmTextGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: LlmProvider> TextGenerator for LlmTextGenerator<P> {
    async fn generate(&self, input: &GenerationInput) -> Result<GeneratedContent, GenerationError> {
        let prompt = render_prompt(input)?;
        let llm_response = self.provider.complete_prompt(&prompt).await?;
        parse_generated_content(&llm_response)
    }
}

pub fn render_prompt(input: &GenerationInput) -> Result<String, GenerationError> {
    let posting = serde_json::to_string_pretty(&input.job_posting)
        .map_err(|e| GenerationError::Provider(format!("cannot serialize job posting: {}", e)))?;
    let profile = match &input.user_profile {
        Some(profile) => serde_json::to_string_pretty(profile)
            .map_err(|e| GenerationError::Provider(format!("cannot serialize user profile: {}", e)))?,
        None => EMPTY_PROFILE.to_string(),
    };
    prompt_generate_application(&posting, &profile)
}

/// The outermost `{...}` span of `text`. Skips prose or a code fence around the object.
fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

// Models are loose with the score's type, so it is read as any JSON value first.
#[derive(Deserialize)]
struct RawContent {
    cv: String,
    motivation_letter: String,
    compatibility_percentage: Value,
}

/// Parses and validates the model's answer.
pub fn parse_generated_content(llm_response: &str) -> Result<GeneratedContent, GenerationError> {
    if llm_response.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let json = json_object_span(llm_response)
        .ok_or_else(|| GenerationError::Unparseable("no JSON object found in response".to_string()))?;
    let raw: RawContent = serde_json::from_str(json).map_err(|e| GenerationError::Unparseable(e.to_string()))?;

    if raw.cv.trim().is_empty() {
        return Err(GenerationError::InvalidContent("cv is empty".to_string()));
    }
    if raw.motivation_letter.trim().is_empty() {
        return Err(GenerationError::InvalidContent("motivation_letter is empty".to_string()));
    }

    Ok(GeneratedContent {
        cv: raw.cv,
        motivation_letter: raw.motivation_letter,
        compatibility_percentage: percentage(&raw.compatibility_percentage)?,
    })
}

/// Accepts `85`, `85.4` and `"85%"`.
fn percentage(value: &Value) -> Result<u8, GenerationError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if (0.0..=100.0).contains(&n) => Ok(n.round() as u8),
        Some(n) => Err(GenerationError::InvalidContent(format!(
            "compatibility_percentage {} is outside 0..=100",
            n
        ))),
        None => Err(GenerationError::Unparseable(format!(
            "compatibility_percentage is not a number: {}",
            value
        ))),
    }
}
