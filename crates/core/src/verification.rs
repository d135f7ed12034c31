//! Fake-report detection: prompt construction and verdict decoding.
//!
//! The orchestrator forwards the model's text untouched. [`VerificationResult::parse`]
//! exists for callers that opt into a typed view; it never replaces the raw text.

use serde::{Deserialize, Serialize};

use crate::incident::Incident;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Sampling temperature for verification calls. Kept low for repeatable verdicts.
pub const VERIFICATION_TEMPERATURE: f32 = 0.2;

/// Upper bound on the model's output length, in tokens.
pub const VERIFICATION_MAX_OUTPUT_TOKENS: u32 = 1024;

const PROMPT_PREAMBLE: &str = "\
You are an AI system that detects fake or misleading emergency reports.

Return STRICT JSON with:
- is_fake (boolean)
- confidence (0-1)
- risk_level (\"LOW\",\"MEDIUM\",\"HIGH\", \"CRITICAL\")
- reasons (array)
- flags (array)

Crisis Data:
";

/// Build the fixed detection instruction with the full incident row appended.
pub fn build_fake_detection_prompt(incident: &Incident) -> String {
    let mut prompt = String::from(PROMPT_PREAMBLE);
    prompt.push_str(&incident.to_prompt_json());
    prompt.push('\n');
    prompt
}

/// Categorical risk assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// The five-field verdict the prompt asks the model for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_fake: bool,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Model output that could not be decoded into a [`VerificationResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(pub String);

impl VerificationResult {
    /// Try to decode model output.
    ///
    /// Accepts the JSON object bare or wrapped in a Markdown code fence.
    /// Confidence outside `[0, 1]` is treated as undecodable.
    pub fn parse(raw: &str) -> Result<Self, RawText> {
        let body = strip_code_fence(raw);
        match serde_json::from_str::<Self>(body) {
            Ok(result) if (0.0..=1.0).contains(&result.confidence) => Ok(result),
            _ => Err(RawText(raw.to_string())),
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
