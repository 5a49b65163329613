//! The network seam: one trait, one `reqwest` implementation.
//!
//! A [`Transport`] performs exactly one attempt and reports what happened. It
//! does not interpret status codes and it never retries; both belong to
//! [`crate::Executor`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};

use crate::{
    BoundRequest, HttpError, RawResponse, TransportError, make_curl, raw_enabled, redact_headers,
    redact_query, snip_body,
};

/// Sends a [`BoundRequest`] and returns the raw response.
///
/// Implementations must be shareable across tasks; the binder holds one behind
/// an `Arc` and may drive it from many concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &BoundRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    inner: Client,
    pub timeout: Duration,
}

impl ReqwestTransport {
    /// Client with a 5s connect timeout and a 15s request timeout.
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            timeout: Duration::from_secs(15),
        })
    }

    /// Override the per-request timeout.
    ///
    /// ```no_run
    /// use perch_http::{HttpError, ReqwestTransport};
    /// use std::time::Duration;
    ///
    /// let transport = ReqwestTransport::new()?.with_timeout(Duration::from_secs(2));
    /// assert_eq!(transport.timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.timeout = dur;
        self
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Build(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::Build(format!("invalid value for header {name}: {e}")))?;
        map.append(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &BoundRequest) -> Result<RawResponse, TransportError> {
        let headers = header_map(&request.headers)?;
        let mut rb = self
            .inner
            .request(request.method.into(), request.url.clone())
            .timeout(self.timeout)
            .headers(headers);
        if let Some(body) = &request.body {
            rb = rb.body(body.clone());
        }

        let (host_path, query) = redact_query(&request.url);
        let auth_kind = if request.header("authorization").is_some() {
            "signed"
        } else {
            "none"
        };
        tracing::debug!(
            method = %request.method,
            host_path = %host_path,
            query = ?query,
            timeout_ms = self.timeout.as_millis() as u64,
            auth_kind,
            body_len = request.body.as_ref().map(Vec::len).unwrap_or(0),
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(request);
            tracing::debug!(target: "http.raw", %curl, "request");
        }

        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            if err.is_builder() {
                TransportError::Build(err.to_string())
            } else {
                TransportError::Network(err.to_string())
            }
        })?;
        let status = resp.status().as_u16();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let response = RawResponse {
            status,
            headers,
            body: bytes.to_vec(),
        };

        tracing::debug!(
            status,
            duration_ms = dur_ms,
            body_len = response.body.len(),
            rate_limit.limit = ?response.header("x-ratelimit-limit"),
            rate_limit.remaining = ?response.header("x-ratelimit-remaining"),
            rate_limit.reset = ?response.header("x-ratelimit-reset"),
            "http.response.headers"
        );
        if raw_enabled() {
            tracing::info!(
                target: "http.raw",
                status,
                duration_ms = dur_ms,
                headers = ?redact_headers(&response.headers),
                body = %response.body_text()
            );
        }
        tracing::trace!(
            body_snippet = %snip_body(&response.body),
            "http.response.body_snippet"
        );

        Ok(response)
    }
}
