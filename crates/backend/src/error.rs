/// A single error kind covering every [`crate::Backend`] operation, matching
/// the original's `BackendException`.
#[derive(Debug, thiserror::Error)]
#[error("backend error: {0}")]
pub struct BackendError(pub String);

impl BackendError {
    /// Wraps an [`std::io::Error`] with the operation that produced it.
    #[must_use]
    pub fn io(context: &str, source: std::io::Error) -> Self {
        Self(format!("{context}: {source}"))
    }
}
