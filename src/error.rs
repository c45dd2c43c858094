use thiserror::Error;

/// Errors produced by the evaluation engine.
///
/// `Config`, `Network`, `Timeout`, and `Http` are per-question failures: the
/// executor catches them and downgrades the affected question to a failed
/// result. `Report` and `Cancelled` are run-fatal and surface to the caller.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Malformed or incomplete configuration for the affected operation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No response reached the client
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded its timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A response was received but carried a non-success status
    #[error("endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The run could not begin at all
    #[error("evaluation could not start: {0}")]
    Report(String),

    /// The run was cancelled before completing
    #[error("evaluation run was cancelled")]
    Cancelled,
}

impl EvalError {
    /// Whether this error aborts the whole run rather than a single question.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::Report(_) | EvalError::Cancelled)
    }
}
