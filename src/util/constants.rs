//! Centralized constants for dispatch and template handling

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// Dispatch Timeouts
// ═══════════════════════════════════════════════════════════════

/// Default timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for reading an HTTP response
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

// ═══════════════════════════════════════════════════════════════
// HTTP Client Limits
// ═══════════════════════════════════════════════════════════════

/// Maximum number of HTTP redirects to follow
pub const REDIRECT_LIMIT: usize = 5;

/// User agent sent by the HTTP dispatcher
pub const USER_AGENT: &str = concat!("jsonbatch/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════
// Numeric Limits
// ═══════════════════════════════════════════════════════════════

/// Most significant digits a decimal operand may carry
pub const MAX_DECIMAL_DIGITS: u64 = 1_000;

/// Largest exponent magnitude (scale) a decimal operand may carry
///
/// Casting expands the exponent into digits, so `1e30000000` must be
/// refused before it reaches the integer arithmetic.
pub const MAX_DECIMAL_EXPONENT: u64 = 1_000;

// ═══════════════════════════════════════════════════════════════
// Template Keys
// ═══════════════════════════════════════════════════════════════

/// Reserved mapping key that turns a list item into a per-element expansion
pub const KEY_ARRAY_PATH: &str = "__array_path";

/// Default status for responses that do not specify one
pub const DEFAULT_STATUS: u16 = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_is_shorter_than_read() {
        assert!(CONNECT_TIMEOUT < READ_TIMEOUT);
    }

    #[test]
    fn redirect_limit_is_reasonable() {
        const _: () = {
            assert!(REDIRECT_LIMIT >= 3);
            assert!(REDIRECT_LIMIT <= 10);
        };
        assert_eq!(REDIRECT_LIMIT, 5);
    }

    #[test]
    fn decimal_limits_allow_wide_values() {
        const _: () = {
            assert!(MAX_DECIMAL_DIGITS >= 64);
            assert!(MAX_DECIMAL_EXPONENT >= 64);
        };
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("jsonbatch/"));
    }
}
