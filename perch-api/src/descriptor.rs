//! Endpoint descriptors: the static shape of one remote operation.
//!
//! Descriptors are `const`-constructible so a binding table can live in
//! `static`/`const` items and be shared by every caller without locking:
//!
//! ```
//! use perch_api::{EndpointDescriptor, Pagination, PayloadKind};
//!
//! const HOME_TIMELINE: EndpointDescriptor = EndpointDescriptor::get("/statuses/home_timeline.json")
//!     .returns_list(PayloadKind::Status)
//!     .allow(&["since_id", "max_id", "count", "page"])
//!     .require_auth()
//!     .paginated(Pagination::PageNumber);
//!
//! assert!(HOME_TIMELINE.requires_auth);
//! assert_eq!(HOME_TIMELINE.positional_count(), 0);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub use perch_http::HttpMethod;

use crate::template;

/// How a response body should be interpreted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Status,
    User,
    DirectMessage,
    Friendship,
    SavedSearch,
    SearchResult,
    List,
    Ids,
    /// Decoded structure returned verbatim.
    Json,
    /// Body is ignored.
    None,
}

impl PayloadKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Status => "status",
            PayloadKind::User => "user",
            PayloadKind::DirectMessage => "direct_message",
            PayloadKind::Friendship => "friendship",
            PayloadKind::SavedSearch => "saved_search",
            PayloadKind::SearchResult => "search_result",
            PayloadKind::List => "list",
            PayloadKind::Ids => "ids",
            PayloadKind::Json => "json",
            PayloadKind::None => "none",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    #[default]
    None,
    /// `page=1,2,3…` until a page comes back empty.
    PageNumber,
    /// `cursor=<token>` until `next_cursor` is 0.
    Cursor,
}

/// Immutable description of one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Path relative to the API root, with `{name}` placeholders.
    pub path: &'static str,
    pub method: HttpMethod,
    pub payload_kind: PayloadKind,
    pub payload_list: bool,
    pub allowed_params: &'static [&'static str],
    pub requires_auth: bool,
    /// Route to the search host/root instead of the main API.
    pub search_api: bool,
    pub pagination: Pagination,
    /// May be invoked through [`crate::Api::probe`].
    pub probe: bool,
    /// First placeholder is filled with the authenticated username.
    pub derived_owner: bool,
}

impl EndpointDescriptor {
    pub const fn new(path: &'static str, method: HttpMethod) -> Self {
        Self {
            path,
            method,
            payload_kind: PayloadKind::None,
            payload_list: false,
            allowed_params: &[],
            requires_auth: false,
            search_api: false,
            pagination: Pagination::None,
            probe: false,
            derived_owner: false,
        }
    }

    pub const fn get(path: &'static str) -> Self {
        Self::new(path, HttpMethod::Get)
    }

    pub const fn post(path: &'static str) -> Self {
        Self::new(path, HttpMethod::Post)
    }

    pub const fn delete(path: &'static str) -> Self {
        Self::new(path, HttpMethod::Delete)
    }

    pub const fn returns(mut self, kind: PayloadKind) -> Self {
        self.payload_kind = kind;
        self.payload_list = false;
        self
    }

    pub const fn returns_list(mut self, kind: PayloadKind) -> Self {
        self.payload_kind = kind;
        self.payload_list = true;
        self
    }

    pub const fn allow(mut self, params: &'static [&'static str]) -> Self {
        self.allowed_params = params;
        self
    }

    pub const fn require_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub const fn on_search_host(mut self) -> Self {
        self.search_api = true;
        self
    }

    pub const fn paginated(mut self, mode: Pagination) -> Self {
        self.pagination = mode;
        self
    }

    pub const fn as_probe(mut self) -> Self {
        self.probe = true;
        self
    }

    /// Fill the first placeholder from the auth collaborator's username.
    /// Implies [`require_auth`](Self::require_auth).
    pub const fn owner_from_auth(mut self) -> Self {
        self.derived_owner = true;
        self.requires_auth = true;
        self
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        template::placeholders(self.path)
    }

    /// Number of positional values a caller must supply.
    pub fn positional_count(&self) -> usize {
        let total = self.placeholders().len();
        if self.derived_owner {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    /// The named parameter a cursor drives for this pagination mode.
    pub const fn pagination_param(&self) -> Option<&'static str> {
        match self.pagination {
            Pagination::None => None,
            Pagination::PageNumber => Some("page"),
            Pagination::Cursor => Some("cursor"),
        }
    }

    /// Listed in `allowed_params`, or the pagination parameter.
    pub fn allows(&self, key: &str) -> bool {
        self.allowed_params.contains(&key) || self.pagination_param() == Some(key)
    }
}
