//! Response parsing seam and the default JSON implementation.
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::descriptor::PayloadKind;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid {kind} payload: {message}")]
    Json { kind: PayloadKind, message: String },

    #[error("expected a list of {kind}, found {found}")]
    NotAList { kind: PayloadKind, found: &'static str },
}

/// Turns a successful response body into the caller's value.
pub trait Parser: Send + Sync {
    type Output: Send;

    fn parse(&self, body: &[u8], kind: PayloadKind, sequence: bool)
    -> Result<Self::Output, ParseError>;
}

/// One page worth of items plus the continuation token, if the server sent one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
}

/// Parser outputs that can feed a [`crate::Cursor`].
pub trait Paginated {
    type Item: Send;

    fn into_page(self) -> Page<Self::Item>;
}

/// What [`JsonParser`] produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `none` payloads; the body is not inspected.
    Empty,
    One(Value),
    Many {
        items: Vec<Value>,
        next_cursor: Option<i64>,
    },
    /// `json` payloads, verbatim.
    Json(Value),
}

impl Payload {
    /// Deserialize a single-object payload into a model type.
    pub fn into_model<T: DeserializeOwned>(self) -> serde_json::Result<Option<T>> {
        match self {
            Payload::One(v) | Payload::Json(v) => serde_json::from_value(v).map(Some),
            Payload::Empty | Payload::Many { .. } => Ok(None),
        }
    }

    /// Deserialize every item of a sequence payload. A single object becomes a
    /// one-element vector.
    pub fn into_models<T: DeserializeOwned>(self) -> serde_json::Result<Vec<T>> {
        match self {
            Payload::Many { items, .. } => items.into_iter().map(serde_json::from_value).collect(),
            Payload::One(v) | Payload::Json(v) => Ok(vec![serde_json::from_value(v)?]),
            Payload::Empty => Ok(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Many { items, .. } => items.len(),
            Payload::One(_) | Payload::Json(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Paginated for Payload {
    type Item = Value;

    fn into_page(self) -> Page<Value> {
        match self {
            Payload::Many { items, next_cursor } => Page { items, next_cursor },
            Payload::One(v) | Payload::Json(v) => Page {
                items: vec![v],
                next_cursor: None,
            },
            Payload::Empty => Page {
                items: Vec::new(),
                next_cursor: None,
            },
        }
    }
}

/// Keys under which list endpoints wrap their arrays.
const WRAPPER_KEYS: &[&str] = &["results", "users", "ids", "lists"];

/// `serde_json`-backed [`Parser`] producing [`Payload`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
    fn decode(body: &[u8], kind: PayloadKind) -> Result<Value, ParseError> {
        serde_json::from_slice(body).map_err(|e| ParseError::Json {
            kind,
            message: e.to_string(),
        })
    }
}

impl Parser for JsonParser {
    type Output = Payload;

    fn parse(&self, body: &[u8], kind: PayloadKind, sequence: bool) -> Result<Payload, ParseError> {
        match kind {
            PayloadKind::None => return Ok(Payload::Empty),
            PayloadKind::Json => return Self::decode(body, kind).map(Payload::Json),
            _ => {}
        }

        let value = Self::decode(body, kind)?;
        if !sequence && kind != PayloadKind::Ids {
            return Ok(Payload::One(value));
        }

        match value {
            Value::Array(items) => Ok(Payload::Many {
                items,
                next_cursor: None,
            }),
            Value::Object(mut obj) => {
                let next_cursor = obj.get("next_cursor").and_then(cursor_value);
                let items = WRAPPER_KEYS
                    .iter()
                    .find_map(|key| match obj.remove(*key) {
                        Some(Value::Array(items)) => Some(items),
                        _ => None,
                    })
                    .ok_or(ParseError::NotAList {
                        kind,
                        found: "object",
                    })?;
                Ok(Payload::Many { items, next_cursor })
            }
            other => Err(ParseError::NotAList {
                kind,
                found: json_type(&other),
            }),
        }
    }
}

/// Cursor tokens arrive as numbers or, from some endpoints, strings.
fn cursor_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Status {
        id: u64,
        text: String,
    }

    #[test]
    fn json_kind_is_verbatim() {
        let out = JsonParser
            .parse(br#"{"resources":{"a":1}}"#, PayloadKind::Json, false)
            .unwrap();
        assert_eq!(out, Payload::Json(json!({"resources": {"a": 1}})));
    }

    #[test]
    fn none_kind_ignores_garbage() {
        let out = JsonParser.parse(b"<html>", PayloadKind::None, false).unwrap();
        assert_eq!(out, Payload::Empty);
    }

    #[test]
    fn sequence_of_statuses_maps_to_models() {
        let out = JsonParser
            .parse(
                br#"[{"id":1,"text":"a"},{"id":2,"text":"b"}]"#,
                PayloadKind::Status,
                true,
            )
            .unwrap();
        let statuses: Vec<Status> = out.into_models().unwrap();
        assert_eq!(statuses[1], Status { id: 2, text: "b".into() });
    }

    #[test]
    fn wrapped_ids_carry_next_cursor() {
        let out = JsonParser
            .parse(
                br#"{"ids":[1,2,3],"next_cursor":123,"previous_cursor":0}"#,
                PayloadKind::Ids,
                false,
            )
            .unwrap();
        let page = out.into_page();
        assert_eq!(page.items, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(page.next_cursor, Some(123));
    }

    #[test]
    fn string_cursor_is_accepted() {
        let out = JsonParser
            .parse(
                br#"{"users":[],"next_cursor_str":"9","next_cursor":"9"}"#,
                PayloadKind::User,
                true,
            )
            .unwrap();
        assert_eq!(out.into_page().next_cursor, Some(9));
    }

    #[test]
    fn search_results_unwrap() {
        let out = JsonParser
            .parse(br#"{"results":[{"id":5}],"page":1}"#, PayloadKind::SearchResult, true)
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn scalar_where_list_expected_is_an_error() {
        let err = JsonParser.parse(b"42", PayloadKind::Status, true).unwrap_err();
        assert!(matches!(err, ParseError::NotAList { found: "number", .. }));
        let err = JsonParser
            .parse(br#"{"id":1}"#, PayloadKind::Status, true)
            .unwrap_err();
        assert!(matches!(err, ParseError::NotAList { found: "object", .. }));
    }

    #[test]
    fn invalid_json_reports_kind() {
        let err = JsonParser.parse(b"{", PayloadKind::User, false).unwrap_err();
        assert!(err.to_string().starts_with("invalid user payload"));
    }
}
