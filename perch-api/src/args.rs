//! Call-time arguments for a binding.
use std::fmt::Display;

use crate::multipart::Multipart;

/// Positional values (path placeholders, in template order), named parameters
/// (in insertion order) and an optional raw body with header overrides.
///
/// ```
/// use perch_api::CallArgs;
///
/// let args = CallArgs::new().arg("alice").param("count", 20).param("page", 2);
/// assert_eq!(args.positional(), ["alice"]);
/// assert_eq!(args.get("count"), Some("20"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    positional: Vec<String>,
    named: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Display) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Add a named parameter. Re-adding a key replaces its value in place.
    pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.set_param(key, value);
        self
    }

    /// Add a named parameter only when `value` is present.
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Supply the request body verbatim along with the headers describing it.
    pub fn raw_body(mut self, body: Vec<u8>, headers: Vec<(String, String)>) -> Self {
        self.body = Some(body);
        self.headers = headers;
        self
    }

    pub fn multipart(self, packed: Multipart) -> Self {
        self.raw_body(packed.body, packed.headers)
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn named(&self) -> &[(String, String)] {
        &self.named
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub(crate) fn set_param(&mut self, key: impl Into<String>, value: impl Display) {
        let key = key.into();
        let value = value.to_string();
        match self.named.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.named.push((key, value)),
        }
    }
}

/// Join identifiers for batch lookups (`user_id=1,2,3`). `None` when empty.
///
/// ```
/// assert_eq!(perch_api::list_to_csv([12, 34, 56]).as_deref(), Some("12,34,56"));
/// assert_eq!(perch_api::list_to_csv(Vec::<u64>::new()), None);
/// ```
pub fn list_to_csv<I>(items: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: Display,
{
    let joined = items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}
