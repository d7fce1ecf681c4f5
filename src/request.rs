use std::fmt;
use std::time::Duration;

use reqwest::Method;

use crate::RetryPolicy;

/// Authentication applied to the outgoing request.
///
/// A non-`None` variant synthesizes exactly one `Authorization` header whose
/// scheme token is `Basic` or `Bearer`; `None` adds nothing.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Authentication {
    #[default]
    None,
    Basic(String),
    Bearer(String),
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic(_) => f.write_str("Basic(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Opaque request payload with its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBody {
    pub content: Vec<u8>,
    pub content_type: String,
}

impl RequestBody {
    pub fn new(content: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// A payload already serialized as JSON text.
    pub fn json(content: impl Into<String>) -> Self {
        Self::new(content.into().into_bytes(), "application/json")
    }
}

/// Immutable description of one logical HTTP call.
///
/// Pure data: no validation happens at construction time. The executor fails
/// fast on an empty endpoint before building the physical request.
///
/// `enable_compression` is a client-profile selector, not a per-request
/// negotiation: it picks which of the executor's two pre-configured transport
/// profiles (compressed or uncompressed) carries every attempt of this call.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub endpoint: String,
    /// Ordered header pairs. Each name is set at most once: a later entry
    /// with the same name overwrites the earlier one in application order.
    pub headers: Vec<(String, String)>,
    pub authentication: Authentication,
    pub body: Option<RequestBody>,
    pub enable_compression: bool,
    pub timeout_per_attempt: Duration,
    pub retry: RetryPolicy,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            method: Method::GET,
            endpoint: String::new(),
            headers: Vec::new(),
            authentication: Authentication::None,
            body: None,
            enable_compression: true,
            timeout_per_attempt: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        }
    }
}

impl RequestSpec {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Appends a header pair; a repeated name overwrites on application.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = authentication;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout_per_attempt: Duration) -> Self {
        self.timeout_per_attempt = timeout_per_attempt;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_matches_documented_contract() {
        let spec = RequestSpec::default();
        assert_eq!(spec.method, Method::GET);
        assert!(spec.endpoint.is_empty());
        assert!(spec.headers.is_empty());
        assert_eq!(spec.authentication, Authentication::None);
        assert!(spec.enable_compression);
        assert_eq!(spec.timeout_per_attempt, Duration::from_secs(15));
        assert_eq!(spec.retry, RetryPolicy::default());
    }

    #[test]
    fn builder_methods_compose() {
        let spec = RequestSpec::post("https://api.example.test/v1/things")
            .with_header("Accept", "application/json")
            .with_header("X-Trace", "abc")
            .with_authentication(Authentication::Bearer("token".to_owned()))
            .with_body(RequestBody::json(r#"{"name":"kit"}"#))
            .with_compression(false)
            .with_timeout(Duration::from_secs(3))
            .with_retry(RetryPolicy::none());

        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.headers.len(), 2);
        assert!(!spec.enable_compression);
        assert_eq!(spec.retry.max_attempts, 0);
        let body = spec.body.expect("body must be set");
        assert_eq!(body.content_type, "application/json");
    }

    #[test]
    fn debug_redacts_credentials() {
        let basic = format!("{:?}", Authentication::Basic("dXNlcjpwdw==".to_owned()));
        let bearer = format!("{:?}", Authentication::Bearer("secret-token".to_owned()));
        assert_eq!(basic, "Basic(<redacted>)");
        assert_eq!(bearer, "Bearer(<redacted>)");
        assert!(!bearer.contains("secret-token"));
    }
}
