/// Domain-level errors shared by every crate in the workspace.
///
/// The HTTP layer maps each variant to a status code; the `Display` output of
/// `NotFound` and `MissingParameter` is what callers see in the error body.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),
}
