//! Handler for the crisis verification endpoint.
//!
//! Straight-line flow: identifier check, one store lookup, one inference
//! call, response. The model's text is returned untouched.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use resqnet_core::crisis_id::CrisisId;
use resqnet_core::error::CoreError;
use resqnet_core::incident::Incident;
use resqnet_core::verification::{
    build_fake_detection_prompt, VerificationResult, VERIFICATION_MAX_OUTPUT_TOKENS,
    VERIFICATION_TEMPERATURE,
};
use resqnet_gemini::{ContentPart, GenerationRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /verify-crisis`.
///
/// `crisis_id` is kept as raw JSON: its type is not part of the contract,
/// and the response echoes it back exactly as sent.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyCrisisRequest {
    #[serde(default)]
    pub crisis_id: Option<Value>,
}

/// Query parameters for `POST /verify-crisis`.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyCrisisQuery {
    /// Also return the decoded verdict under `parsed`.
    #[serde(default)]
    pub parse: bool,
}

/// Response body for `POST /verify-crisis`.
#[derive(Debug, Serialize)]
pub struct VerifyCrisisResponse {
    pub crisis_id: Value,
    /// The model's output, verbatim.
    pub ai_verification: String,
    /// Present only when `?parse=true`; `null` if the output did not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Option<VerificationResult>>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /verify-crisis
pub async fn verify_crisis(
    State(state): State<AppState>,
    query: Result<Query<VerifyCrisisQuery>, QueryRejection>,
    payload: Result<Json<VerifyCrisisRequest>, JsonRejection>,
) -> AppResult<Json<VerifyCrisisResponse>> {
    let Query(query) = query?;
    let Json(body) = payload?;

    let crisis_id = CrisisId::require(body.crisis_id.as_ref())?;
    tracing::info!(%crisis_id, "Verifying crisis report");

    let incident = state
        .incidents
        .fetch_by_id(crisis_id.as_str())
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Crisis",
            id: crisis_id.to_string(),
        })?;

    let ai_verification = run_fake_detection(&state, &incident).await?;

    let parsed = query
        .parse
        .then(|| VerificationResult::parse(&ai_verification).ok());

    Ok(Json(VerifyCrisisResponse {
        crisis_id: crisis_id.into_raw(),
        ai_verification,
        parsed,
    }))
}

/// Ask the model whether `incident` looks fake, returning its raw text.
async fn run_fake_detection(state: &AppState, incident: &Incident) -> AppResult<String> {
    let request = detection_request(&state.config.gemini.model, incident);
    Ok(state.inference.generate(&request).await?)
}

/// The prompt, plus the incident image when the row has one.
fn detection_request(model: &str, incident: &Incident) -> GenerationRequest {
    let mut parts = vec![ContentPart::Text(build_fake_detection_prompt(incident))];
    if let Some(url) = incident.image_url() {
        parts.push(ContentPart::ImageUrl(url.to_string()));
    }

    GenerationRequest {
        model: model.to_string(),
        parts,
        temperature: VERIFICATION_TEMPERATURE,
        max_output_tokens: VERIFICATION_MAX_OUTPUT_TOKENS,
    }
}
