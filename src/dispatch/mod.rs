//! # Request Dispatch
//!
//! The engine never talks to the network itself; every built request goes
//! through a [`RequestDispatcher`].
//!
//! | Dispatcher | Use Case | Features |
//! |------------|----------|----------|
//! | [`HttpDispatcher`] | Production | reqwest, pooled clients, per-request read timeout |
//! | [`MockDispatcher`] | Testing | Canned responses by `METHOD url`, request recording |
//!
//! ```rust
//! use jsonbatch::dispatch::DispatchOptions;
//!
//! let options = DispatchOptions::default();
//! assert_eq!(options.connect_timeout_ms, 10_000);
//! assert!(options.fail_back_as_string);
//! ```

mod http;
mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Request, Response};
use crate::util::{CONNECT_TIMEOUT, READ_TIMEOUT};

pub use http::HttpDispatcher;
pub use mock::MockDispatcher;

/// Sends one resolved request and returns its response
///
/// Failures propagate to the caller unchanged and abort the batch; retry
/// policy, if any, belongs to the implementation.
#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    async fn dispatch(&self, request: &Request, options: &DispatchOptions) -> Result<Response>;
}

/// Transport switches carried by a batch template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    #[serde(alias = "connectTimeoutMs")]
    pub connect_timeout_ms: u64,
    #[serde(alias = "readTimeoutMs")]
    pub read_timeout_ms: u64,
    /// Keep a non-JSON response body as a string instead of failing
    #[serde(alias = "failBackAsString")]
    pub fail_back_as_string: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
            read_timeout_ms: READ_TIMEOUT.as_millis() as u64,
            fail_back_as_string: true,
        }
    }
}
