//! Batch engine
//!
//! Walks a template tree one step at a time:
//!
//! ```text
//! SelectRequest ──match──▶ Dispatch ──▶ CheckBreak ──match──▶ Done(break response)
//!      ▲  │                                 │
//!      │  └─none──▶ SelectFinal ──▶ Done    │
//!      └───────────── nested requests ◀─────┘
//! ```
//!
//! Exactly one branch is active at a time; candidates are chosen by first
//! match and a taken branch is never revisited.

use std::sync::Arc;

use bigdecimal::ToPrimitive;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::batch::{BatchTemplate, Guarded, RequestTemplate, ResponseTemplate};
use crate::context::ExecutionContext;
use crate::dispatch::{DispatchOptions, RequestDispatcher};
use crate::error::{BatchError, Result};
use crate::function::FunctionRegistry;
use crate::model::{headers_from_value, Headers, Request, Response};
use crate::template::TemplateBuilder;
use crate::util::numeric::{stringify, to_boolean, to_integer};
use crate::util::{Document, DEFAULT_STATUS};

enum State<'t> {
    SelectRequest(&'t [RequestTemplate]),
    Dispatch(&'t RequestTemplate),
    CheckBreak(&'t RequestTemplate),
    SelectFinal,
    Done(Response),
}

/// Executes batch templates against a dispatcher
///
/// The engine itself is immutable and may serve concurrent `execute` calls;
/// each call owns its own [`ExecutionContext`].
pub struct BatchEngine {
    builder: TemplateBuilder,
    dispatcher: Arc<dyn RequestDispatcher>,
    default_options: DispatchOptions,
}

impl BatchEngine {
    /// Engine with the builtin functions and default dispatch options
    pub fn new(dispatcher: Arc<dyn RequestDispatcher>) -> Self {
        Self {
            builder: TemplateBuilder::default(),
            dispatcher,
            default_options: DispatchOptions::default(),
        }
    }

    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.builder = TemplateBuilder::new(functions);
        self
    }

    /// Options used for templates without `dispatch_options`
    pub fn with_default_options(mut self, options: DispatchOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn builder(&self) -> &TemplateBuilder {
        &self.builder
    }

    /// Run one batch
    #[instrument(skip_all, fields(method = %original.http_method, url = %original.url))]
    pub async fn execute(&self, original: &Request, template: &BatchTemplate) -> Result<Response> {
        let options = template.dispatch_options.unwrap_or(self.default_options);
        let mut ctx = ExecutionContext::new(original);
        let mut state = State::SelectRequest(&template.requests);
        info!(templates = template.request_count(), "batch started");

        loop {
            state = match state {
                State::SelectRequest(candidates) => match self.choose(candidates, ctx.document())? {
                    Some(next) => State::Dispatch(next),
                    None => State::SelectFinal,
                },
                State::Dispatch(step) => {
                    let index = ctx.steps();
                    info!(index, "preparing request");
                    let request = self.build_request(step, ctx.document())?;
                    info!(index, method = %request.http_method, url = %request.url, "dispatching request");
                    let response = self.dispatcher.dispatch(&request, &options).await?;
                    info!(index, status = response.status, "received response");
                    ctx.push(&request, &response);
                    State::CheckBreak(step)
                }
                State::CheckBreak(step) => match self.choose(&step.responses, ctx.document())? {
                    Some(found) => {
                        info!(steps = ctx.steps(), "break response matched");
                        State::Done(self.build_response(found, ctx.document())?)
                    }
                    None => State::SelectRequest(&step.requests),
                },
                State::SelectFinal => match self.choose(&template.responses, ctx.document())? {
                    Some(found) => {
                        info!(steps = ctx.steps(), "final response matched");
                        State::Done(self.build_response(found, ctx.document())?)
                    }
                    None => {
                        info!(steps = ctx.steps(), "no final response matched, returning the context");
                        State::Done(Response::new(DEFAULT_STATUS, ctx.to_value()))
                    }
                },
                State::Done(response) => {
                    info!(status = response.status, steps = ctx.steps(), "batch finished");
                    return Ok(response);
                }
            };
        }
    }

    /// First candidate whose predicate is absent or holds
    fn choose<'t, T: Guarded>(&self, candidates: &'t [T], doc: &Document) -> Result<Option<&'t T>> {
        for (index, candidate) in candidates.iter().enumerate() {
            let taken = match candidate.predicate() {
                None => true,
                Some(predicate) => predicate_holds(self.builder.build(predicate, doc)?)?,
            };
            if taken {
                debug!(index, "candidate selected");
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn build_request(&self, step: &RequestTemplate, doc: &Document) -> Result<Request> {
        let http_method = required_text(self.builder.build(&step.http_method, doc)?, "http method")?;
        let url = required_text(self.builder.build(&step.url, doc)?, "url")?;
        let body = self.build_optional(step.body.as_ref(), doc)?;
        let headers = self.build_headers(step.headers.as_ref(), doc)?;
        Ok(Request {
            http_method,
            url,
            headers,
            body,
        })
    }

    fn build_response(&self, found: &ResponseTemplate, doc: &Document) -> Result<Response> {
        let status = match &found.status {
            Some(status) => status_code(self.builder.build(status, doc)?)?,
            None => DEFAULT_STATUS,
        };
        Ok(Response {
            status,
            headers: self.build_headers(found.headers.as_ref(), doc)?,
            body: self.build_optional(found.body.as_ref(), doc)?,
        })
    }

    fn build_optional(&self, template: Option<&Value>, doc: &Document) -> Result<Value> {
        match template {
            Some(template) => self.builder.build(template, doc),
            None => Ok(Value::Null),
        }
    }

    fn build_headers(&self, template: Option<&Value>, doc: &Document) -> Result<Headers> {
        match template {
            Some(template) => headers_from_value(self.builder.build(template, doc)?),
            None => Ok(Headers::new()),
        }
    }
}

/// `null` is false; anything else must be boolean-like
fn predicate_holds(value: Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        other => to_boolean(&other).ok_or_else(|| BatchError::cast(&other, "boolean")),
    }
}

fn required_text(value: Value, what: &str) -> Result<String> {
    match value {
        Value::Null => Err(BatchError::cast(&Value::Null, what)),
        Value::String(text) => Ok(text),
        other => Ok(stringify(&other)),
    }
}

/// `null` means 200; otherwise an integer in 100..=999
fn status_code(value: Value) -> Result<u16> {
    if value.is_null() {
        return Ok(DEFAULT_STATUS);
    }
    to_integer(&value)
        .and_then(|d| d.to_u16())
        .filter(|code| (100..=999).contains(code))
        .ok_or_else(|| BatchError::cast(&value, "HTTP status"))
}
