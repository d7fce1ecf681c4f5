/// Error type returned by this crate.
///
/// Transport failures and non-success statuses never surface here; the retry
/// loop folds them into the [`crate::ResponseEnvelope`]. A caller can observe
/// contract violations caught before any network activity, cancellation, and
/// — from the typed convenience path only — a payload decode failure.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The request descriptor failed validation before any attempt was made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The caller's cancellation token fired during an attempt or a backoff wait.
    #[error("request cancelled")]
    Cancelled,
    /// A success payload failed to decode via [`crate::HttpExecutor::execute_json`].
    #[error("decode error: {0}")]
    Decode(String),
}
