//! Client for the hosted generative model used to judge crisis reports.
//!
//! [`InferenceClient`] is the seam the orchestrator depends on; [`GeminiApi`]
//! implements it over the `generateContent` REST endpoint using [`reqwest`].

pub mod api;
pub mod generation;

pub use api::{GeminiApi, GeminiConfig, DEFAULT_API_BASE};
pub use generation::{ContentPart, GenerationRequest, InferenceClient, InferenceError};
