//! Result and error types for internal invariant violations.

/// The result type for operations that can only fail because of a compiler bug.
///
/// User-facing problems (unsupported statements, configuration violations) are
/// reported as diagnostics by the transformer. `Err` here means an invariant
/// of hast itself was broken, e.g. a lowering cursor pointing at a block that
/// does not exist.
pub type HastResult<T> = Result<T, InternalError>;

/// An internal compiler error: a bug in hast, not a problem with the input.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the broken invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
