//! REST client for the `generateContent` endpoint.
//!
//! Text parts are sent as `text`, image references as `fileData` with a MIME
//! type guessed from the URL. The reply's text parts are concatenated, which
//! is what callers of the official SDKs get from `response.text`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generation::{ContentPart, GenerationRequest, InferenceClient, InferenceError};

/// Public endpoint of the hosted model API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Connection parameters for [`GeminiApi`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Base URL without the version segment.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP client for the hosted model API.
pub struct GeminiApi {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    FileData(FileData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'static str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => Part::Text(text),
                ContentPart::ImageUrl(url) => Part::FileData(FileData {
                    mime_type: guess_image_mime(url),
                    file_uri: url,
                }),
            })
            .collect();

        Self {
            contents: vec![Content { role: "user", parts }],
            generation_config: WireGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }
}

impl GenerateContentResponse {
    /// Concatenate the non-thought text parts of the first candidate.
    fn into_text(self) -> Result<String, InferenceError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(InferenceError::EmptyResponse(format!("prompt blocked: {reason}")));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(InferenceError::EmptyResponse("no candidates".to_string()));
        };

        let text: Option<String> = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect()
            })
            .filter(|text: &String| !text.is_empty());

        text.ok_or_else(|| {
            InferenceError::EmptyResponse(format!(
                "no text parts (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })
    }
}

/// MIME type for an image URL, from its path extension. Defaults to JPEG.
fn guess_image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "image/jpeg",
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GeminiApi {
    /// Build the client and its HTTP connection pool.
    pub fn new(config: GeminiConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.api_base, config.api_key))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_base: &str, api_key: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl InferenceClient for GeminiApi {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError> {
        let body = GenerateContentRequest::from_request(request);

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, request.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response: GenerateContentResponse = Self::ensure_success(response).await?.json().await?;
        let text = response.into_text()?;

        tracing::debug!(model = %request.model, response = %text, "Inference response");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    const KEY: &str = "test-key";

    /// Requests seen by the fake endpoint: (model path segment, body).
    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn(reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::default();

        async fn generate(
            State((seen, reply)): State<(Seen, Value)>,
            Path(model): Path<String>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> (StatusCode, Json<Value>) {
            if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(KEY) {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": {"message": "API key not valid"}})),
                );
            }
            seen.lock().unwrap().push((model, body));
            (StatusCode::OK, Json(reply))
        }

        let router = Router::new()
            .route("/v1beta/models/{model}", post(generate))
            .with_state((Arc::clone(&seen), reply));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn api(base: &str, key: &str) -> GeminiApi {
        GeminiApi::new(GeminiConfig {
            api_key: key.to_string(),
            api_base: base.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request(parts: Vec<ContentPart>) -> GenerationRequest {
        GenerationRequest {
            model: "gemini-3-flash-preview".to_string(),
            parts,
            temperature: 0.2,
            max_output_tokens: 1024,
        }
    }

    fn text_reply(parts: Value) -> Value {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": parts }, "finishReason": "STOP" }]
        })
    }

    #[tokio::test]
    async fn sends_parts_and_generation_config() {
        let (base, seen) = spawn(text_reply(json!([{ "text": "{}" }]))).await;

        let text = api(&base, KEY)
            .generate(&request(vec![
                ContentPart::Text("judge this".into()),
                ContentPart::ImageUrl("https://cdn.example.org/a.PNG?w=200".into()),
            ]))
            .await
            .unwrap();

        assert_eq!(text, "{}");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (model, body) = &seen[0];
        assert_eq!(model, "gemini-3-flash-preview:generateContent");
        assert_eq!(
            body,
            &json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "judge this" },
                        { "fileData": { "mimeType": "image/png", "fileUri": "https://cdn.example.org/a.PNG?w=200" } }
                    ]
                }],
                "generationConfig": { "temperature": 0.2, "maxOutputTokens": 1024 }
            })
        );
    }

    #[tokio::test]
    async fn returns_text_verbatim() {
        let raw = "```json\n{\"is_fake\": true}\n```";
        let (base, _) = spawn(text_reply(json!([{ "text": raw }]))).await;

        let text = api(&base, KEY).generate(&request(vec![ContentPart::Text("x".into())])).await;

        assert_eq!(text.unwrap(), raw);
    }

    #[tokio::test]
    async fn concatenates_text_parts_and_skips_thoughts() {
        let (base, _) = spawn(text_reply(json!([
            { "text": "thinking...", "thought": true },
            { "text": "{\"is_fake\": " },
            { "text": "false}" }
        ])))
        .await;

        let text = api(&base, KEY).generate(&request(vec![ContentPart::Text("x".into())])).await;

        assert_eq!(text.unwrap(), "{\"is_fake\": false}");
    }

    #[tokio::test]
    async fn no_candidates_is_empty_response() {
        let (base, _) = spawn(json!({ "candidates": [] })).await;

        let result = api(&base, KEY).generate(&request(vec![ContentPart::Text("x".into())])).await;

        assert_matches!(result, Err(InferenceError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn blocked_prompt_is_empty_response() {
        let (base, _) = spawn(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).await;

        let result = api(&base, KEY).generate(&request(vec![ContentPart::Text("x".into())])).await;

        assert_matches!(result, Err(InferenceError::EmptyResponse(msg)) if msg.contains("SAFETY"));
    }

    #[tokio::test]
    async fn rejected_key_is_api_error() {
        let (base, seen) = spawn(text_reply(json!([{ "text": "{}" }]))).await;

        let result = api(&base, "bad-key").generate(&request(vec![ContentPart::Text("x".into())])).await;

        assert_matches!(result, Err(InferenceError::Api { status: 403, body }) if body.contains("API key not valid"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(guess_image_mime("https://x.org/a.webp"), "image/webp");
        assert_eq!(guess_image_mime("https://x.org/a.jpeg#frag"), "image/jpeg");
        assert_eq!(guess_image_mime("https://x.org/storage/v1/object/img"), "image/jpeg");
    }
}
