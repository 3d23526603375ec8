//! Batch execution context
//!
//! `{ original, requests: [...], responses: [...] }`, append-only. The
//! queryable [`Document`] is re-derived after each recorded step, so a step
//! always reads exactly the results of the steps before it.

use serde_json::{json, Value};

use crate::model::{Request, Response};
use crate::util::Document;

const KEY_ORIGINAL: &str = "original";
const KEY_REQUESTS: &str = "requests";
const KEY_RESPONSES: &str = "responses";

/// Owned by one `execute` call; never shared
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    original: Value,
    requests: Vec<Value>,
    responses: Vec<Value>,
    document: Document,
}

impl ExecutionContext {
    pub fn new(original: &Request) -> Self {
        let original = original.to_value();
        let document = Document::new(json!({
            KEY_ORIGINAL: original,
            KEY_REQUESTS: [],
            KEY_RESPONSES: [],
        }));
        Self {
            original,
            requests: Vec::new(),
            responses: Vec::new(),
            document,
        }
    }

    /// Record one dispatched step; requests and responses stay index-aligned
    pub fn push(&mut self, request: &Request, response: &Response) {
        self.requests.push(request.to_value());
        self.responses.push(response.to_value());
        self.document = Document::new(self.to_value());
    }

    /// Document to evaluate the next step against
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of dispatched steps
    pub fn steps(&self) -> usize {
        self.requests.len()
    }

    pub fn to_value(&self) -> Value {
        json!({
            KEY_ORIGINAL: self.original,
            KEY_REQUESTS: self.requests,
            KEY_RESPONSES: self.responses,
        })
    }
}
