// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Error types with codes and fix suggestions
//!
//! Error code ranges:
//! - JB-000-009: Template input errors
//! - JB-010-019: Expression syntax / query errors
//! - JB-020-029: Function errors
//! - JB-030-039: Cast errors
//! - JB-040-049: Template shape errors
//! - JB-050-059: Dispatch errors
//! - JB-060-069: Configuration errors
//! - JB-090-099: IO / serialization errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Every failure that can abort a batch invocation.
///
/// None of these are recovered inside the engine: the first one raised while
/// resolving a template, evaluating a predicate or dispatching a request
/// surfaces to the caller.
#[derive(Error, Debug)]
pub enum BatchError {
    // ═══════════════════════════════════════════
    // TEMPLATE INPUT ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[JB-001] Failed to parse template: {details}")]
    TemplateParse { details: String },

    // ═══════════════════════════════════════════
    // SYNTAX / QUERY ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[JB-010] Syntax error at position {position} in '{input}': {details}")]
    Syntax {
        input: String,
        position: usize,
        details: String,
    },

    #[error("[JB-011] Invalid JSONPath '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    // ═══════════════════════════════════════════
    // FUNCTION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[JB-020] Unsupported function: {name}")]
    UnsupportedFunction { name: String },

    #[error("[JB-021] Function '{name}' is already registered")]
    DuplicateFunction { name: String },

    #[error("[JB-022] Function '{function}' rejected its arguments: {reason}")]
    FunctionArgument { function: String, reason: String },

    // ═══════════════════════════════════════════
    // CAST ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[JB-030] Cannot cast {value} to {target}")]
    Cast { value: String, target: String },

    // ═══════════════════════════════════════════
    // TEMPLATE SHAPE ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[JB-040] Missing array path in child schema: {details}")]
    MissingArrayPath { details: String },

    #[error("[JB-041] Array path '{path}' resolved to {found}, expected an array")]
    ArrayPathNotSequence { path: String, found: String },

    #[error("[JB-042] Unsupported schema value: {kind}")]
    UnsupportedSchemaShape { kind: String },

    // ═══════════════════════════════════════════
    // DISPATCH ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[JB-050] Request to {url} failed: {reason}")]
    Dispatch { url: String, reason: String },

    #[error("[JB-051] Request to {url} timed out after {timeout_ms}ms")]
    DispatchTimeout { url: String, timeout_ms: u64 },

    #[error("[JB-052] Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("[JB-053] Invalid HTTP method '{method}'")]
    InvalidMethod { method: String },

    #[error("[JB-054] Response body from {url} is not JSON: {reason}")]
    ResponseBody { url: String, reason: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[JB-060] Configuration error: {reason}")]
    Config { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[JB-090] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[JB-091] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("[JB-092] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BatchError {
    /// Get the error code (e.g., "JB-030")
    pub fn code(&self) -> &'static str {
        match self {
            Self::TemplateParse { .. } => "JB-001",
            Self::Syntax { .. } => "JB-010",
            Self::InvalidPath { .. } => "JB-011",
            Self::UnsupportedFunction { .. } => "JB-020",
            Self::DuplicateFunction { .. } => "JB-021",
            Self::FunctionArgument { .. } => "JB-022",
            Self::Cast { .. } => "JB-030",
            Self::MissingArrayPath { .. } => "JB-040",
            Self::ArrayPathNotSequence { .. } => "JB-041",
            Self::UnsupportedSchemaShape { .. } => "JB-042",
            Self::Dispatch { .. } => "JB-050",
            Self::DispatchTimeout { .. } => "JB-051",
            Self::InvalidUrl { .. } => "JB-052",
            Self::InvalidMethod { .. } => "JB-053",
            Self::ResponseBody { .. } => "JB-054",
            Self::Config { .. } => "JB-060",
            Self::Io(_) => "JB-090",
            Self::Json(_) => "JB-091",
            Self::Yaml(_) => "JB-092",
        }
    }

    /// Whether the error came from the transport layer rather than the template
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Dispatch { .. }
                | Self::DispatchTimeout { .. }
                | Self::InvalidUrl { .. }
                | Self::InvalidMethod { .. }
                | Self::ResponseBody { .. }
        )
    }

    /// Shorthand for a cast failure, rendering the offending value compactly
    pub(crate) fn cast(value: &serde_json::Value, target: impl Into<String>) -> Self {
        let mut rendered = value.to_string();
        if rendered.len() > 64 {
            let mut cut = 61;
            while !rendered.is_char_boundary(cut) {
                cut -= 1;
            }
            rendered.truncate(cut);
            rendered.push_str("...");
        }
        Self::Cast {
            value: rendered,
            target: target.into(),
        }
    }

    pub(crate) fn syntax(input: &str, position: usize, details: impl Into<String>) -> Self {
        Self::Syntax {
            input: input.to_string(),
            position,
            details: details.into(),
        }
    }
}

impl FixSuggestion for BatchError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BatchError::TemplateParse { .. } => {
                Some("Check the template is valid JSON/YAML with 'requests' and 'responses' lists")
            }
            BatchError::Syntax { .. } => {
                Some("Balance the parentheses of every call and quote literals containing '(' or ','")
            }
            BatchError::InvalidPath { .. } => Some("Use JSONPath syntax such as $.responses[0].body.id"),
            BatchError::UnsupportedFunction { .. } => {
                Some("Register the function or use a builtin: sum, min, max, average, and, or, coalesce, not, concat, len, eq, ne, gt, gte, lt, lte")
            }
            BatchError::DuplicateFunction { .. } => Some("Give every registered function a unique name"),
            BatchError::FunctionArgument { .. } => Some("Check the argument types passed to the function"),
            BatchError::Cast { .. } => {
                Some("Check the type prefix (str, int, num, bool, obj) matches the resolved value")
            }
            BatchError::MissingArrayPath { .. } => {
                Some("Add \"__array_path\": \"$.path.to.array\" to mappings nested in a list")
            }
            BatchError::ArrayPathNotSequence { .. } => {
                Some("Point __array_path at an array, e.g. $.responses[0].body[*]")
            }
            BatchError::UnsupportedSchemaShape { .. } => {
                Some("Write literal values as strings with a type prefix, e.g. \"int 42\" or \"bool true\"")
            }
            BatchError::Dispatch { .. } => Some("Check the target service is reachable"),
            BatchError::DispatchTimeout { .. } => {
                Some("Raise read_timeout_ms / connect_timeout_ms in dispatch_options")
            }
            BatchError::InvalidUrl { .. } => Some("Resolve the url expression to an absolute http(s) URL"),
            BatchError::InvalidMethod { .. } => Some("Use an HTTP method such as GET, POST, PUT or DELETE"),
            BatchError::ResponseBody { .. } => {
                Some("Set fail_back_as_string: true in dispatch_options to keep non-JSON bodies")
            }
            BatchError::Config { .. } => Some("Check ~/.config/jsonbatch/config.toml syntax"),
            BatchError::Io(_) => Some("Check file path and permissions"),
            BatchError::Json(_) => Some("Check the JSON syntax"),
            BatchError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}
