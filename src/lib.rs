//! `resilient-http` drives a single logical HTTP request through zero or
//! more physical attempts against a transient, rate-limited remote service.
//!
//! The caller builds a [`RequestSpec`] and hands it to an [`HttpExecutor`],
//! which races each attempt against a per-attempt timeout, retries transient
//! failures (transport errors and 503/408/504 statuses) with exponential
//! backoff, and returns a normalized [`ResponseEnvelope`]. Raw transport
//! errors never reach the caller; cancellation does, as a distinct outcome.

mod envelope;
mod error;
mod executor;
mod policy;
mod request;
mod sleep;

pub use envelope::{ResponseEnvelope, EXHAUSTION_MESSAGE, EXHAUSTION_STATUS};
pub use error::ExecutorError;
pub use executor::HttpExecutor;
pub use policy::{is_retryable_status, RetryPolicy};
pub use request::{Authentication, RequestBody, RequestSpec};
pub use sleep::{Sleeper, TokioSleeper};

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, ExecutorError>;
