//! Mock dispatcher for testing
//!
//! Serves canned responses without touching the network and records every
//! request it receives.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{DispatchOptions, RequestDispatcher};
use crate::error::{BatchError, Result};
use crate::model::{Request, Response};

#[derive(Debug, Clone)]
enum Reply {
    Respond(Response),
    Fail(String),
}

/// Dispatcher that answers from a route table keyed by `METHOD url`
///
/// Each route holds a queue: replies are served in order and the last one
/// repeats. Unrouted requests get the fallback response.
pub struct MockDispatcher {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Response,
    received: Mutex<Vec<Request>>,
}

fn route_key(method: &str, url: &str) -> String {
    format!("{} {}", method.trim().to_ascii_uppercase(), url)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDispatcher {
    /// Mock answering every request with `200 null`
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback: Response::default(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Response for requests matching no route
    pub fn with_fallback(mut self, response: Response) -> Self {
        self.fallback = response;
        self
    }

    /// Queue a response for `method url`
    pub fn with_route(self, method: &str, url: &str, response: Response) -> Self {
        self.push(method, url, Reply::Respond(response));
        self
    }

    /// Queue a transport failure for `method url`
    pub fn with_failure(self, method: &str, url: &str, reason: impl Into<String>) -> Self {
        self.push(method, url, Reply::Fail(reason.into()));
        self
    }

    fn push(&self, method: &str, url: &str, reply: Reply) {
        lock(&self.routes)
            .entry(route_key(method, url))
            .or_default()
            .push_back(reply);
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<Request> {
        lock(&self.received).clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        lock(&self.received).last().cloned()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.received).len()
    }

    fn reply_for(&self, request: &Request) -> Reply {
        let mut routes = lock(&self.routes);
        match routes.get_mut(&route_key(&request.http_method, &request.url)) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Reply::Respond(self.fallback.clone())),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Reply::Respond(self.fallback.clone())),
            None => Reply::Respond(self.fallback.clone()),
        }
    }
}

#[async_trait]
impl RequestDispatcher for MockDispatcher {
    async fn dispatch(&self, request: &Request, _options: &DispatchOptions) -> Result<Response> {
        lock(&self.received).push(request.clone());
        match self.reply_for(request) {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(reason) => Err(BatchError::Dispatch {
                url: request.url.clone(),
                reason,
            }),
        }
    }
}
