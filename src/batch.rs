//! Batch template structures
//!
//! A template is plain data, loaded from JSON or YAML. Expression fields
//! (`predicate`, `http_method`, `url`, `body`, `headers`, `status`) hold
//! template values resolved by the [`TemplateBuilder`](crate::template::TemplateBuilder)
//! at the point of use; nothing is validated ahead of execution.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::DispatchOptions;
use crate::error::{BatchError, Result};
use crate::model::null_as_default;

/// Root of a template tree
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchTemplate {
    /// Falls back to the configured defaults when absent
    #[serde(default, alias = "dispatchOptions")]
    pub dispatch_options: Option<DispatchOptions>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: Vec<RequestTemplate>,
    /// Final responses, used once no request step matches any more
    #[serde(default, deserialize_with = "null_as_default")]
    pub responses: Vec<ResponseTemplate>,
}

/// One request step and the subtree below it
#[derive(Debug, Clone, Deserialize)]
pub struct RequestTemplate {
    /// Absent means always taken
    #[serde(default)]
    pub predicate: Option<Value>,
    #[serde(alias = "httpMethod")]
    pub http_method: Value,
    pub url: Value,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
    /// Candidates for the next step
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: Vec<RequestTemplate>,
    /// Break responses, checked right after this step
    #[serde(default, deserialize_with = "null_as_default")]
    pub responses: Vec<ResponseTemplate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseTemplate {
    #[serde(default)]
    pub predicate: Option<Value>,
    /// Absent means 200
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
}

/// Something with an optional predicate, selected by first match
pub trait Guarded {
    fn predicate(&self) -> Option<&Value>;
}

impl Guarded for RequestTemplate {
    fn predicate(&self) -> Option<&Value> {
        self.predicate.as_ref()
    }
}

impl Guarded for ResponseTemplate {
    fn predicate(&self) -> Option<&Value> {
        self.predicate.as_ref()
    }
}

impl BatchTemplate {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| BatchError::TemplateParse {
            details: e.to_string(),
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| BatchError::TemplateParse {
            details: e.to_string(),
        })
    }

    /// Load from a file; `.yaml` / `.yml` are read as YAML, anything else as JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Number of request templates in the whole tree
    pub fn request_count(&self) -> usize {
        fn count(requests: &[RequestTemplate]) -> usize {
            requests.iter().map(|r| 1 + count(&r.requests)).sum()
        }
        count(&self.requests)
    }
}
