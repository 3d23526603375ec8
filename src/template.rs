//! Template builder
//!
//! Resolves an arbitrary template value against a context document:
//! - string → evaluated as a schema
//! - mapping → every entry resolved, keys and order preserved
//! - sequence → elements resolved and spliced (see [`TemplateBuilder::build`])
//!
//! A mapping inside a sequence is an array expansion: its `__array_path`
//! names a sequence in the context, and the rest of the mapping is built once
//! per element with the context narrowed to that element.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BatchError, Result};
use crate::expr::Evaluator;
use crate::function::FunctionRegistry;
use crate::util::jsonpath::value_kind;
use crate::util::{Document, KEY_ARRAY_PATH};

/// Builds JSON values from templates
pub struct TemplateBuilder {
    evaluator: Evaluator,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self::new(Arc::new(FunctionRegistry::with_builtins()))
    }
}

impl TemplateBuilder {
    pub fn new(functions: Arc<FunctionRegistry>) -> Self {
        Self {
            evaluator: Evaluator::new(functions),
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Resolve a template value
    pub fn build(&self, template: &Value, doc: &Document) -> Result<Value> {
        match template {
            Value::String(schema) => self.evaluator.eval(schema, doc),
            Value::Object(map) => self.build_object(map, doc),
            Value::Array(items) => self.build_array(items, doc),
            other => Err(BatchError::UnsupportedSchemaShape {
                kind: value_kind(other).to_string(),
            }),
        }
    }

    fn build_object(&self, map: &Map<String, Value>, doc: &Document) -> Result<Value> {
        let mut out = Map::with_capacity(map.len());
        for (key, schema) in map {
            if key == KEY_ARRAY_PATH {
                continue;
            }
            out.insert(key.clone(), self.build(schema, doc)?);
        }
        Ok(Value::Object(out))
    }

    fn build_array(&self, items: &[Value], doc: &Document) -> Result<Value> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(schema) => match self.evaluator.eval(schema, doc)? {
                    Value::Array(values) => out.extend(values),
                    value => out.push(value),
                },
                Value::Object(map) => out.extend(self.expand(map, doc)?),
                Value::Array(nested) => out.push(self.build_array(nested, doc)?),
                other => {
                    return Err(BatchError::UnsupportedSchemaShape {
                        kind: value_kind(other).to_string(),
                    })
                }
            }
        }
        Ok(Value::Array(out))
    }

    /// One built mapping per element of the sequence at `__array_path`
    fn expand(&self, map: &Map<String, Value>, doc: &Document) -> Result<Vec<Value>> {
        let path = match map.get(KEY_ARRAY_PATH) {
            Some(Value::String(path)) => path,
            Some(other) => {
                return Err(BatchError::MissingArrayPath {
                    details: format!("{KEY_ARRAY_PATH} must be a string, found {}", value_kind(other)),
                })
            }
            None => {
                return Err(BatchError::MissingArrayPath {
                    details: format!(
                        "mapping with keys [{}] has no {KEY_ARRAY_PATH}",
                        map.keys().cloned().collect::<Vec<_>>().join(", ")
                    ),
                })
            }
        };

        let elements = doc.read_array(path)?;
        debug!(path = %path, elements = elements.len(), "array expansion");
        elements
            .into_iter()
            .map(|element| self.build_object(map, &Document::new(element)))
            .collect()
    }
}
