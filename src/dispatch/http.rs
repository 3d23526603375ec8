//! HTTP dispatcher over reqwest
//!
//! One pooled client is kept per distinct connect timeout (lock-free cache);
//! the read timeout is applied per request.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reqwest::{redirect, Client, Method};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{DispatchOptions, RequestDispatcher};
use crate::config::HttpConfig;
use crate::error::{BatchError, Result};
use crate::model::{Headers, Request, Response};

/// Production dispatcher
pub struct HttpDispatcher {
    clients: DashMap<u64, Client>,
    settings: HttpConfig,
}

impl Default for HttpDispatcher {
    fn default() -> Self {
        Self::new(HttpConfig::default())
    }
}

impl HttpDispatcher {
    pub fn new(settings: HttpConfig) -> Self {
        Self {
            clients: DashMap::new(),
            settings,
        }
    }

    /// Client for a connect timeout, built on first use
    fn client(&self, connect_timeout_ms: u64) -> Result<Client> {
        match self.clients.entry(connect_timeout_ms) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let client = Client::builder()
                    .connect_timeout(Duration::from_millis(connect_timeout_ms))
                    .redirect(redirect::Policy::limited(self.settings.redirect_limit))
                    .user_agent(self.settings.user_agent.as_str())
                    .build()
                    .map_err(|e| BatchError::Config {
                        reason: format!("cannot build HTTP client: {e}"),
                    })?;
                debug!(connect_timeout_ms, "built HTTP client");
                Ok(entry.insert(client).clone())
            }
        }
    }

    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Validate an absolute http(s) URL
fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| BatchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(BatchError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
        BatchError::InvalidMethod {
            method: raw.to_string(),
        }
    })
}

/// Response body as JSON; empty is `null`
fn decode_body(url: &str, text: &str, fail_back_as_string: bool) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) if fail_back_as_string => Ok(Value::String(text.to_string())),
        Err(e) => Err(BatchError::ResponseBody {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn transport_error(url: &str, error: reqwest::Error, options: &DispatchOptions) -> BatchError {
    if error.is_timeout() {
        let timeout_ms = if error.is_connect() {
            options.connect_timeout_ms
        } else {
            options.read_timeout_ms
        };
        return BatchError::DispatchTimeout {
            url: url.to_string(),
            timeout_ms,
        };
    }
    BatchError::Dispatch {
        url: url.to_string(),
        reason: error.to_string(),
    }
}

#[async_trait]
impl RequestDispatcher for HttpDispatcher {
    #[instrument(skip(self, request, options), fields(method = %request.http_method, url = %request.url))]
    async fn dispatch(&self, request: &Request, options: &DispatchOptions) -> Result<Response> {
        let url = parse_url(&request.url)?;
        let method = parse_method(&request.http_method)?;
        let client = self.client(options.connect_timeout_ms)?;

        let mut builder = client
            .request(method, url.as_str())
            .timeout(Duration::from_millis(options.read_timeout_ms));
        for (name, values) in &request.headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.body.is_null() {
            builder = builder.json(&request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(&request.url, e, options))?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(&request.url, e, options))?;
        let body = decode_body(&request.url, &text, options.fail_back_as_string)?;
        debug!(status, bytes = text.len(), "response decoded");

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
