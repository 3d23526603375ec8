//! Utilities Module - shared infrastructure
//!
//! - `constants`: Centralized timeouts, limits and reserved keys
//! - `jsonpath`: JSONPath reads over a context document
//! - `numeric`: Decimal / boolean coercion and stringification

pub mod constants;
pub mod jsonpath;
pub mod numeric;

// Re-export public types
pub use constants::{
    CONNECT_TIMEOUT, DEFAULT_STATUS, KEY_ARRAY_PATH, MAX_DECIMAL_DIGITS, MAX_DECIMAL_EXPONENT, READ_TIMEOUT,
    REDIRECT_LIMIT, USER_AGENT,
};
pub use jsonpath::Document;
