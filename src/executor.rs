use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::{
    envelope::AttemptFailure,
    policy::{backoff_delay, is_retryable_status},
    sleep::{Sleeper, TokioSleeper},
    Authentication, ExecutorError, RequestSpec, ResponseEnvelope, Result,
};

/// Drives one logical HTTP call through zero or more physical attempts.
///
/// Holds two pre-configured transport profiles (compressed and uncompressed);
/// a request's `enable_compression` flag selects one before the attempt loop
/// begins and it stays fixed for every attempt of that call. The executor
/// keeps no mutable state between calls and is safe to share across tasks.
#[derive(Clone)]
pub struct HttpExecutor {
    compressed: reqwest::Client,
    uncompressed: reqwest::Client,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("sleeper", &"<sleeper>")
            .finish_non_exhaustive()
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one physical attempt, before retry classification.
enum AttemptOutcome {
    /// The server answered; any status code counts, success or not.
    Response { status: reqwest::StatusCode, body: String },
    /// No HTTP response was obtained for this attempt.
    Failed(AttemptFailure),
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::with_sleeper(Arc::new(TokioSleeper))
    }

    /// Creates an executor with an injected backoff sleeper.
    pub fn with_sleeper(sleeper: Arc<dyn Sleeper>) -> Self {
        Self::from_clients(
            reqwest::Client::new(),
            reqwest::Client::builder()
                .no_gzip()
                .no_brotli()
                .build()
                .expect("http client construction must not fail"),
            sleeper,
        )
    }

    /// Creates an executor from caller-supplied transport profiles.
    pub fn from_clients(
        compressed: reqwest::Client,
        uncompressed: reqwest::Client,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            compressed,
            uncompressed,
            sleeper,
        }
    }

    /// Executes one logical call and returns its normalized envelope.
    ///
    /// Retryable statuses (503/408/504), transport errors, and per-attempt
    /// timeouts are retried up to `request.retry.max_attempts` extra attempts
    /// with exponential backoff between them. Any other status is terminal
    /// and returned as-is. If the budget runs out on a retryable status, the
    /// last real response is returned; if it runs out without any HTTP
    /// response, the synthetic 400 sentinel is returned instead.
    ///
    /// Cancellation during an in-flight attempt or a backoff wait aborts the
    /// whole call with [`ExecutorError::Cancelled`]; it is never folded into
    /// an envelope.
    pub async fn execute(
        &self,
        request: &RequestSpec,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<String>> {
        if request.endpoint.trim().is_empty() {
            return Err(ExecutorError::InvalidRequest(
                "endpoint must not be empty".to_owned(),
            ));
        }
        // A malformed URL can never succeed on retry; reject it before the
        // attempt loop rather than burning the backoff budget on it.
        reqwest::Url::parse(&request.endpoint).map_err(|err| {
            ExecutorError::InvalidRequest(format!(
                "invalid endpoint '{}': {err}",
                request.endpoint
            ))
        })?;
        let headers = build_headers(request)?;
        let client = if request.enable_compression {
            &self.compressed
        } else {
            &self.uncompressed
        };

        let max_attempts = request.retry.max_attempts;
        let mut last_failure = None;

        for attempt in 0..=max_attempts {
            match self.send_once(client, request, headers.clone(), cancel).await? {
                AttemptOutcome::Response { status, body } => {
                    if is_retryable_status(status) && attempt < max_attempts {
                        self.wait_before_retry(request, attempt, cancel).await?;
                        continue;
                    }
                    // Terminal answer, or a retryable status on the last
                    // attempt: return the real response, never a synthetic one.
                    return Ok(ResponseEnvelope::from_response(status, body));
                }
                AttemptOutcome::Failed(failure) => {
                    last_failure = Some(failure);
                    if attempt < max_attempts {
                        self.wait_before_retry(request, attempt, cancel).await?;
                    }
                }
            }
        }

        Ok(ResponseEnvelope::exhausted(last_failure.as_ref()))
    }

    /// Executes one logical call and decodes the success payload as JSON.
    ///
    /// Thin wrapper over [`HttpExecutor::execute`] followed by
    /// [`ResponseEnvelope::decode_json`]: the decoder runs only on the
    /// success path, and failure envelopes pass through with `T::default()`
    /// as data. A payload that fails to decode surfaces as
    /// [`ExecutorError::Decode`].
    pub async fn execute_json<T>(
        &self,
        request: &RequestSpec,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<T>>
    where
        T: DeserializeOwned + Default,
    {
        let envelope = self.execute(request, cancel).await?;
        envelope
            .decode_json()
            .map_err(|err| ExecutorError::Decode(err.to_string()))
    }

    async fn send_once(
        &self,
        client: &reqwest::Client,
        request: &RequestSpec,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome> {
        let mut builder = client
            .request(request.method.clone(), &request.endpoint)
            .headers(headers)
            .timeout(request.timeout_per_attempt);
        if let Some(body) = &request.body {
            builder = builder.body(body.content.clone());
        }

        // Cancellation short-circuits a pending attempt timeout: whichever
        // fires first wins, and the in-flight connection is dropped.
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExecutorError::Cancelled),
            response = builder.send() => response,
        };

        let response = match response {
            Ok(response) => response,
            // Builder errors are contract violations, not transient faults.
            Err(err) if err.is_builder() => {
                return Err(ExecutorError::InvalidRequest(format!(
                    "unable to build request: {err}"
                )))
            }
            Err(err) => return Ok(AttemptOutcome::Failed(classify_transport(err))),
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExecutorError::Cancelled),
            body = response.text() => body,
        };
        match body {
            Ok(body) => Ok(AttemptOutcome::Response { status, body }),
            Err(err) => Ok(AttemptOutcome::Failed(classify_transport(err))),
        }
    }

    /// Waits `multiplier ^ attempt` seconds before the next attempt.
    ///
    /// The wait itself is cancellable: cancellation during the sleep aborts
    /// the call instead of proceeding to the next attempt.
    async fn wait_before_retry(
        &self,
        request: &RequestSpec,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let delay = backoff_delay(request.retry.delay_multiplier_secs, attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt,
            delay_secs = delay.as_secs(),
            "retrying http request after backoff"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
            _ = self.sleeper.sleep(delay) => Ok(()),
        }
    }
}

/// Builds the physical header map from the descriptor.
///
/// Descriptor headers apply in order with overwrite-on-duplicate semantics;
/// entries with an empty name are skipped. A non-`None` authentication
/// variant then installs exactly one `Authorization` header, replacing any
/// caller-supplied value for that name.
fn build_headers(request: &RequestSpec) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in &request.headers {
        if name.trim().is_empty() {
            continue;
        }
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            ExecutorError::InvalidRequest(format!("invalid header name '{name}': {err}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|err| {
            ExecutorError::InvalidRequest(format!("invalid value for header '{name}': {err}"))
        })?;
        map.insert(name, value);
    }

    if let Some(body) = &request.body {
        let value = HeaderValue::from_str(&body.content_type).map_err(|err| {
            ExecutorError::InvalidRequest(format!("invalid content type: {err}"))
        })?;
        map.insert(CONTENT_TYPE, value);
    }

    let authorization = match &request.authentication {
        Authentication::None => None,
        Authentication::Basic(credentials) => Some(format!("Basic {credentials}")),
        Authentication::Bearer(token) => Some(format!("Bearer {token}")),
    };
    if let Some(authorization) = authorization {
        let value = HeaderValue::from_str(&authorization).map_err(|err| {
            ExecutorError::InvalidRequest(format!("invalid authorization value: {err}"))
        })?;
        map.insert(AUTHORIZATION, value);
    }

    Ok(map)
}

fn classify_transport(err: reqwest::Error) -> AttemptFailure {
    if err.is_timeout() {
        AttemptFailure::Timeout(err.to_string())
    } else {
        AttemptFailure::Socket(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestSpec;

    #[test]
    fn headers_apply_in_order_with_overwrite() {
        let request = RequestSpec::get("https://api.example.test/")
            .with_header("X-Tag", "first")
            .with_header("Accept", "application/json")
            .with_header("X-Tag", "second");

        let map = build_headers(&request).expect("headers must build");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x-tag").and_then(|v| v.to_str().ok()), Some("second"));
    }

    #[test]
    fn empty_header_names_are_skipped() {
        let request = RequestSpec::get("https://api.example.test/")
            .with_header("", "ignored")
            .with_header("  ", "ignored")
            .with_header("Accept", "text/plain");

        let map = build_headers(&request).expect("headers must build");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn authentication_installs_exactly_one_authorization_header() {
        let request = RequestSpec::get("https://api.example.test/")
            .with_header("Authorization", "stale-value")
            .with_authentication(Authentication::Bearer("token-123".to_owned()));

        let map = build_headers(&request).expect("headers must build");
        let values: Vec<_> = map.get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].to_str().unwrap(), "Bearer token-123");
    }

    #[test]
    fn basic_authentication_uses_basic_scheme_token() {
        let request = RequestSpec::get("https://api.example.test/")
            .with_authentication(Authentication::Basic("dXNlcjpwdw==".to_owned()));

        let map = build_headers(&request).expect("headers must build");
        assert_eq!(
            map.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Basic dXNlcjpwdw==")
        );
    }

    #[test]
    fn no_authentication_adds_no_authorization_header() {
        let request = RequestSpec::get("https://api.example.test/");
        let map = build_headers(&request).expect("headers must build");
        assert!(map.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn invalid_header_name_is_rejected_before_any_attempt() {
        let request =
            RequestSpec::get("https://api.example.test/").with_header("bad name", "value");
        let err = build_headers(&request).expect_err("header name with a space must fail");
        assert!(matches!(err, ExecutorError::InvalidRequest(_)));
    }

    #[test]
    fn debug_does_not_leak_internals() {
        let executor = HttpExecutor::new();
        let debug = format!("{executor:?}");
        assert!(debug.contains("HttpExecutor"));
        assert!(debug.contains("<sleeper>"));
    }
}
