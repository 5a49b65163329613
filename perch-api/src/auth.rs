//! The auth capability consumed by the binder, plus a bearer-token
//! implementation.
use perch_config::AuthSettings;
use perch_http::BoundRequest;

use crate::error::{Error, Result};

/// Signs requests on behalf of a user. OAuth handshakes live elsewhere; the
/// binder only needs these three questions answered.
pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Return a signed copy of `request`.
    fn sign(&self, request: BoundRequest) -> Result<BoundRequest>;

    /// Screen name of the authenticated account, when known.
    fn username(&self) -> Option<String>;
}

/// `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
    username: Option<String>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

impl BearerAuth {
    pub fn new(token: &str, username: Option<String>) -> Result<Self> {
        Ok(Self {
            token: sanitize_token(token)?,
            username,
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        Self::new(&settings.token, settings.username.clone())
    }
}

impl Authenticator for BearerAuth {
    fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    fn sign(&self, request: BoundRequest) -> Result<BoundRequest> {
        Ok(request.with_header("Authorization", format!("Bearer {}", self.token)))
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }
}

/// Tokens pasted from dashboards often carry quotes, stray spaces or line
/// breaks; strip those and refuse anything that cannot sit in a header.
fn sanitize_token(raw: &str) -> Result<String> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(Error::Credentials("token is empty".into()));
    }
    if !s.is_ascii() {
        return Err(Error::Credentials("token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(Error::Credentials("token contains control characters".into()));
    }
    Ok(s)
}
