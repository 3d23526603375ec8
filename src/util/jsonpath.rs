//! JSONPath reads over a context document
//!
//! Query evaluation is delegated to `jsonpath-rust`. On top of it this module
//! applies "definite path" rules so a read behaves like a value lookup:
//! - `$.a.b`, `$.a[0]` → the single matched value, or `null`
//! - `$.a[*]`, `$..b`, `$.a[?(@.x)]`, `$.a[0,1]`, `$.a[1:3]` → an array of matches

use std::str::FromStr;

use jsonpath_rust::path::config::JsonPathConfig;
use jsonpath_rust::{JsonPathInst, JsonPtr};
use serde_json::Value;
use tracing::trace;

use crate::error::{BatchError, Result};

/// A queryable JSON document
///
/// Cheap to build; the engine re-derives one after every dispatched step so
/// reads never observe a half-updated context.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The underlying JSON value
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Read a path. Unresolvable paths yield `null` (definite) or `[]` (indefinite).
    pub fn read(&self, path: &str) -> Result<Value> {
        let inst = JsonPathInst::from_str(path).map_err(|reason| BatchError::InvalidPath {
            path: path.to_string(),
            reason,
        })?;
        // Query the borrowed root; only matched nodes are cloned
        let matches = inst.find_slice(&self.root, JsonPathConfig::default());
        trace!(path, matches = matches.len(), "jsonpath read");

        if is_definite(path) {
            Ok(matches.into_iter().next().map(owned).unwrap_or(Value::Null))
        } else {
            Ok(Value::Array(matches.into_iter().map(owned).collect()))
        }
    }

    /// Read a path that must name a sequence (`null` counts as empty)
    pub fn read_array(&self, path: &str) -> Result<Vec<Value>> {
        match self.read(path)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items),
            other => Err(BatchError::ArrayPathNotSequence {
                path: path.to_string(),
                found: value_kind(&other).to_string(),
            }),
        }
    }
}

impl From<Value> for Document {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

fn owned(found: JsonPtr<'_, Value>) -> Value {
    match found {
        JsonPtr::Slice(value) => value.clone(),
        JsonPtr::NewValue(value) => value,
    }
}

/// Whether a path can match at most one node
///
/// Deep scans, wildcards, filters, unions and slices make a path indefinite.
pub fn is_definite(path: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut prev = '\0';

    for ch in path.chars() {
        if let Some(q) = quote {
            if ch == q && prev != '\\' {
                quote = None;
            }
            prev = ch;
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '*' => return false,
            '.' if prev == '.' => return false,
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '?' | ',' | ':' if depth > 0 => return false,
            _ => {}
        }
        prev = ch;
    }
    true
}

/// Short name of a JSON value's kind, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
