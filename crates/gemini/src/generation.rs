use async_trait::async_trait;

/// One piece of model input, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// A publicly reachable image, referenced by URL.
    ImageUrl(String),
}

/// A single content-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Errors from the inference layer. The orchestrator does not classify
/// these; they surface as a generic server fault.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status (bad key, quota, bad model...).
    #[error("Inference API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The call succeeded but produced no text.
    #[error("Inference returned no text: {0}")]
    EmptyResponse(String),
}

/// Text generation from an ordered list of content parts.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run one generation call and return the model's text verbatim.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError>;
}
