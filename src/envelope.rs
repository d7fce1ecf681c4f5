use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Fixed message carried by the exhaustion sentinel envelope.
pub const EXHAUSTION_MESSAGE: &str = "Unable to complete Http Request.";

/// Status code of the exhaustion sentinel.
///
/// Returned only when every physical attempt failed at the transport level
/// and no HTTP response was ever obtained. This is a sentinel, not a real
/// server outcome: no remote ever answered 400.
pub const EXHAUSTION_STATUS: u16 = 400;

/// Why a physical attempt produced no HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AttemptFailure {
    /// The attempt exceeded its per-attempt timeout.
    Timeout(String),
    /// Connection-level failure: refused, reset, DNS, etc.
    Socket(String),
}

impl AttemptFailure {
    fn describe(&self) -> String {
        match self {
            Self::Timeout(detail) => format!("attempt timed out: {detail}"),
            Self::Socket(detail) => format!("socket error: {detail}"),
        }
    }
}

/// Normalized outcome of one logical call.
///
/// Constructed once by the executor, immutable afterwards, returned by value.
/// Callers never observe raw transport errors: success or failure, the
/// envelope is self-describing via `is_success` and `errors`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    /// True iff the final attempt returned a 2xx status other than 404.
    pub is_success: bool,
    pub status_code: u16,
    pub status_description: String,
    /// Decoded payload on success; `T::default()` otherwise.
    pub data: T,
    /// Empty on success; at least one entry on failure.
    pub errors: Vec<String>,
}

impl ResponseEnvelope<String> {
    /// Classifies a real HTTP response into the envelope.
    ///
    /// 404 is a failure by explicit policy even though it is a well-formed
    /// "found nothing" answer: absence of a resource is never success at
    /// this layer.
    pub(crate) fn from_response(status: StatusCode, body: String) -> Self {
        let is_success = status.is_success() && status != StatusCode::NOT_FOUND;
        if is_success {
            Self {
                is_success: true,
                status_code: status.as_u16(),
                status_description: describe_status(status),
                data: body,
                errors: Vec::new(),
            }
        } else {
            Self {
                is_success: false,
                status_code: status.as_u16(),
                status_description: describe_status(status),
                data: String::new(),
                errors: vec![format!(
                    "Http request returned non-success status {} {}.",
                    status.as_u16(),
                    describe_status(status)
                )],
            }
        }
    }

    /// Sentinel envelope for a retry loop that exhausted its budget without
    /// ever obtaining an HTTP response.
    pub(crate) fn exhausted(last_failure: Option<&AttemptFailure>) -> Self {
        let mut errors = vec![EXHAUSTION_MESSAGE.to_owned()];
        if let Some(failure) = last_failure {
            errors.push(failure.describe());
        }
        Self {
            is_success: false,
            status_code: EXHAUSTION_STATUS,
            status_description: "Bad Request".to_owned(),
            data: String::new(),
            errors,
        }
    }

    /// Decodes the success payload as JSON into `T`.
    ///
    /// The decoder runs only on the success path; failure envelopes pass
    /// through with `T::default()` as data. Decode errors are the caller's
    /// concern and surface directly rather than entering the retry taxonomy.
    pub fn decode_json<T>(self) -> serde_json::Result<ResponseEnvelope<T>>
    where
        T: DeserializeOwned + Default,
    {
        if !self.is_success {
            return Ok(self.map(|_| T::default()));
        }
        let data = serde_json::from_str(&self.data)?;
        Ok(ResponseEnvelope {
            is_success: self.is_success,
            status_code: self.status_code,
            status_description: self.status_description,
            data,
            errors: self.errors,
        })
    }
}

impl<T> ResponseEnvelope<T> {
    /// Maps the payload through a caller-supplied decoder, leaving the
    /// classification fields untouched.
    pub fn map<U>(self, decode: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            is_success: self.is_success,
            status_code: self.status_code,
            status_description: self.status_description,
            data: decode(self.data),
            errors: self.errors,
        }
    }
}

fn describe_status(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown Status").to_owned()
}
