//! HTTP plumbing for the Perch request binder: plain-data requests, a pluggable
//! transport, and a bounded retry executor.
//!
//! - [`BoundRequest`] / [`RawResponse`] describe one round-trip as owned data
//! - [`Transport`] is the only seam that touches the network; [`ReqwestTransport`]
//!   is the production implementation
//! - [`Executor`] drives a transport under a [`RetryPolicy`] (linear delay,
//!   bounded attempts, configurable retryable statuses)
//! - Redacts `Authorization` and secret query params, never logs secret values
//! - Optional *raw* request/response logging via `PERCH_HTTP_RAW=1`
//!
//! ```no_run
//! # async fn demo() -> Result<(), perch_http::HttpError> {
//! use perch_http::{BoundRequest, Executor, HttpMethod, ReqwestTransport, RetryPolicy};
//! use std::sync::Arc;
//! use url::Url;
//!
//! let transport = Arc::new(ReqwestTransport::new()?);
//! let executor = Executor::new(transport, RetryPolicy::default().with_retry_count(2));
//! let url = Url::parse("https://api.example.com/1/help/test.json").unwrap();
//! let response = executor.execute(&BoundRequest::new(HttpMethod::Get, url)).await?;
//! assert!(response.is_success());
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), retries and final errors, plus
//! curl-style raw lines (target `http.raw`) when `PERCH_HTTP_RAW=1`.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use thiserror::Error;
use url::Url;

pub mod retry;
pub mod transport;

pub use retry::{Executor, RetryPolicy};
pub use transport::{ReqwestTransport, Transport};

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "PERCH_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

pub(crate) fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

// ==============================
// Request / response data
// ==============================

/// HTTP verbs used by the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully constructed request for one invocation.
///
/// Values are rebuilt for every call; decorators such as request signing take
/// the request by value and hand back a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl BoundRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing value with the same
    /// (case-insensitive) name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Status, headers and body as returned by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

// ==============================
// Errors
// ==============================

/// Failure reported by a [`Transport`] for a single attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, timeout or body-read failure; eligible for retry.
    #[error("network error: {0}")]
    Network(String),
    /// The request could not be turned into a wire request; never retried.
    #[error("request build failed: {0}")]
    Build(String),
}

/// Final outcome of an [`Executor`] run that did not end in a 2xx.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: usize },
    #[error("server returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },
}

// ==============================
// Helpers
// ==============================

/// Best-effort human message from an error body.
pub(crate) fn extract_error_message(body: &[u8]) -> String {
    // {"errors":[{"message":"...", "code": 34}]}
    #[derive(Deserialize)]
    struct Errors {
        errors: Vec<ErrEntry>,
    }
    #[derive(Deserialize)]
    struct ErrEntry {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
    }

    // {"error":"...", "request":"/1/..."}
    #[derive(Deserialize)]
    struct Single {
        #[serde(default)]
        error: String,
        #[serde(default)]
        message: String,
    }

    if let Ok(env) = serde_json::from_slice::<Errors>(body) {
        if let Some(first) = env.errors.into_iter().next() {
            if !first.message.is_empty() {
                return first.message;
            }
            if !first.detail.is_empty() {
                return first.detail;
            }
        }
    }
    if let Ok(m) = serde_json::from_slice::<Single>(body) {
        if !m.error.is_empty() {
            return m.error;
        }
        if !m.message.is_empty() {
            return m.message;
        }
    }
    snip_body(body)
}

pub(crate) fn snip_body(body: &[u8]) -> String {
    truncate_text(String::from_utf8_lossy(body).to_string(), SNIPPET_MAX)
}

fn truncate_text(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

fn is_secret_key(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
            | "oauth_token"
            | "oauth_signature"
    )
}

/// Redact sensitive headers for logging.
pub(crate) fn redact_headers(h: &[(String, String)]) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let val = if k.eq_ignore_ascii_case("authorization") {
                "<redacted>".to_string()
            } else {
                v.clone()
            };
            (k.clone(), val)
        })
        .collect()
}

/// "host + path" string and redacted query list for logging.
pub(crate) fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = if is_secret_key(&k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k, v)
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
pub(crate) fn make_curl(request: &BoundRequest) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", request.method)];
    for (name, val) in redact_headers(&request.headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if let Some(bytes) = &request.body {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                let s = truncate_text(s.to_string(), RAW_MAX_BODY);
                parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
            }
            Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", bytes.len())),
        }
    }
    let mut url = request.url.clone();
    let (_, query) = redact_query(&request.url);
    if !query.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(query);
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}
