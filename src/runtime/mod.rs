//! Runtime Module - batch execution
//!
//! - `engine`: the request/response state machine over a template tree
//!
//! Static structure lives in `batch`; per-invocation state in `context`.

mod engine;

pub use engine::BatchEngine;
