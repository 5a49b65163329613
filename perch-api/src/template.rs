//! Path templating and parameter encoding.
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

use crate::error::{Error, Result};

/// Everything except RFC 3986 unreserved characters is escaped, so a value
/// can never introduce a `/`, `?` or `#` into the path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// `{name}` placeholders in order of appearance.
pub fn placeholders(template: &'static str) -> Vec<&'static str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        names.push(&after[..close]);
        rest = &after[close + 1..];
    }
    names
}

/// Substitute `values` into the template left to right, escaping each one.
///
/// ```
/// let path = perch_api::template::render_path("/{owner}/lists/{slug}.json", &["alice", "my list"]).unwrap();
/// assert_eq!(path, "/alice/lists/my%20list.json");
/// ```
pub fn render_path<S: AsRef<str>>(template: &'static str, values: &[S]) -> Result<String> {
    let expected = placeholders(template).len();
    if expected != values.len() {
        return Err(Error::PathSubstitution {
            template,
            expected,
            supplied: values.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    let mut values = values.iter();
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        if let Some(value) = values.next() {
            out.extend(utf8_percent_encode(value.as_ref(), PATH_SEGMENT));
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// `application/x-www-form-urlencoded` serialisation, insertion order kept.
pub fn encode_params(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}
