//! Concrete requests and responses
//!
//! These are fully resolved values: what a dispatcher receives and returns,
//! and what gets appended to the execution context after each step.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::{BatchError, Result};
use crate::util::numeric::stringify;
use crate::util::DEFAULT_STATUS;

/// Header name → ordered values, names kept in insertion order
pub type Headers = IndexMap<String, Vec<String>>;

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_status() -> u16 {
    DEFAULT_STATUS
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, alias = "httpMethod", deserialize_with = "null_as_default")]
    pub http_method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Headers,
    #[serde(default)]
    pub body: Value,
}

impl Request {
    pub fn new(http_method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Context representation: `{http_method, url, headers, body}`
    pub fn to_value(&self) -> Value {
        json!({
            "http_method": self.http_method,
            "url": self.url,
            "headers": self.headers,
            "body": self.body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Headers,
    #[serde(default)]
    pub body: Value,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            headers: Headers::new(),
            body: Value::Null,
        }
    }
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Context representation: `{status, headers, body}`
    pub fn to_value(&self) -> Value {
        json!({
            "status": self.status,
            "headers": self.headers,
            "body": self.body,
        })
    }
}

/// Coerce a resolved headers value
///
/// `null` means no headers. Each entry of a mapping becomes a list: a
/// sequence contributes its stringified elements, a scalar a single value,
/// and a `null` entry is dropped.
pub fn headers_from_value(value: Value) -> Result<Headers> {
    match value {
        Value::Null => Ok(Headers::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(name, v)| {
                let values = match v {
                    Value::Array(items) => items.iter().map(stringify).collect(),
                    scalar => vec![stringify(&scalar)],
                };
                (name, values)
            })
            .collect()),
        other => Err(BatchError::cast(&other, "headers mapping")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_shape() {
        let request = Request::new("POST", "http://x/a")
            .with_header("X-Id", "1")
            .with_body(json!({"k": 1}));
        assert_eq!(
            request.to_value(),
            json!({
                "http_method": "POST",
                "url": "http://x/a",
                "headers": {"X-Id": ["1"]},
                "body": {"k": 1}
            })
        );
    }

    #[test]
    fn test_request_fields_default() {
        let request: Request = serde_json::from_value(json!({"url": "u", "headers": null})).unwrap();
        assert_eq!(request.http_method, "");
        assert!(request.headers.is_empty());
        assert_eq!(request.body, Value::Null);
    }

    #[test]
    fn test_request_accepts_camel_case() {
        let request: Request = serde_json::from_value(json!({"httpMethod": "GET", "url": "u"})).unwrap();
        assert_eq!(request.http_method, "GET");
    }

    #[test]
    fn test_response_defaults_to_200() {
        let response: Response = serde_json::from_value(json!({"body": [1]})).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(Response::default().status, 200);
    }

    #[test]
    fn test_headers_from_sequence_and_scalar() {
        let headers = headers_from_value(json!({
            "Accept": ["a", 1, true],
            "X-Count": 3,
            "X-None": null
        }))
        .unwrap();
        assert_eq!(headers["Accept"], vec!["a", "1", "true"]);
        assert_eq!(headers["X-Count"], vec!["3"]);
        assert!(!headers.contains_key("X-None"));
    }

    #[test]
    fn test_headers_keep_template_order() {
        let headers = headers_from_value(json!({
            "Zeta": "1",
            "Alpha": "2",
            "Mid": "3"
        }))
        .unwrap();
        let names: Vec<&str> = headers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);

        let value = Response::new(200, Value::Null).with_header("B", "1").with_header("A", "2").to_value();
        assert_eq!(value["headers"].to_string(), r#"{"B":["1"],"A":["2"]}"#);
    }

    #[test]
    fn test_headers_null_and_invalid() {
        assert!(headers_from_value(Value::Null).unwrap().is_empty());
        assert_eq!(headers_from_value(json!("x")).unwrap_err().code(), "JB-030");
    }
}
