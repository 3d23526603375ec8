//! jsonbatch - declarative batch templates for chained HTTP requests
//!
//! A batch template is a tree of request steps. Every method, URL, body,
//! predicate and response in it is an expression evaluated against the
//! accumulated context: the original request plus every request/response
//! produced so far.
//!
//! ```text
//! runtime::BatchEngine ─▶ template::TemplateBuilder ─▶ expr::Evaluator ─▶ token / types / function
//!        │
//!        └─▶ dispatch::RequestDispatcher (HTTP or mock)
//! ```
//!
//! ```rust
//! use jsonbatch::{Document, TemplateBuilder};
//! use serde_json::json;
//!
//! let doc = Document::new(json!({"original": {"body": {"ids": [1, 2]}}}));
//! let out = TemplateBuilder::default()
//!     .build(&json!({"count": "len($.original.body.ids)", "first": "str $.original.body.ids"}), &doc)
//!     .unwrap();
//! assert_eq!(out, json!({"count": 2, "first": "1"}));
//! ```

pub mod batch;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod function;
pub mod model;
pub mod runtime;
pub mod template;
pub mod util;

pub use batch::{BatchTemplate, RequestTemplate, ResponseTemplate};
pub use config::BatchConfig;
pub use context::ExecutionContext;
pub use dispatch::{DispatchOptions, HttpDispatcher, MockDispatcher, RequestDispatcher};
pub use error::{BatchError, FixSuggestion, Result};
pub use expr::{Evaluator, ValueType};
pub use function::{DirectFunction, FoldFunction, FoldStep, Function, FunctionRegistry};
pub use model::{Headers, Request, Response};
pub use runtime::BatchEngine;
pub use template::TemplateBuilder;
pub use util::Document;
