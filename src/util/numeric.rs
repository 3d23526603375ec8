//! Numeric and boolean coercion helpers
//!
//! Values are kept as `BigDecimal` while being cast or combined. Results go
//! back into JSON as `i64`/`u64` when integral and in range, otherwise as an
//! exact decimal `Number` (serde_json `arbitrary_precision`), so no digit is
//! lost on the way out.
//!
//! Operands are bounded by [`MAX_DECIMAL_DIGITS`] and [`MAX_DECIMAL_EXPONENT`];
//! anything larger is treated as non-numeric.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde_json::{Number, Value};

use super::constants::{MAX_DECIMAL_DIGITS, MAX_DECIMAL_EXPONENT};

/// Longest text worth handing to the decimal parser
const MAX_DECIMAL_TEXT: usize = MAX_DECIMAL_DIGITS as usize + 32;

/// Coerce a numeric or numeric-string value to a decimal
pub fn to_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

/// Coerce to a decimal with no fractional part (`"5.0"` is accepted, `"5.5"` is not)
pub fn to_integer(value: &Value) -> Option<BigDecimal> {
    to_decimal(value)
        .filter(|d| d.is_integer())
        .map(|d| d.with_scale(0))
}

/// Coerce a boolean-like value
///
/// Accepts booleans, numbers (zero is false) and the strings
/// `true/false/yes/no/1/0` in any case.
pub fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(_) => to_decimal(value).map(|d| !d.is_zero()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a decimal literal, rejecting empty, non-numeric and oversized text
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    if text.is_empty() || text.len() > MAX_DECIMAL_TEXT || text.chars().any(char::is_whitespace) {
        return None;
    }
    BigDecimal::from_str(text).ok().filter(within_limits)
}

/// Parse an integer literal: optional sign followed by digits only
pub fn parse_integer(text: &str) -> Option<BigDecimal> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    parse_decimal(text)
}

fn within_limits(d: &BigDecimal) -> bool {
    d.digits() <= MAX_DECIMAL_DIGITS && d.fractional_digit_count().unsigned_abs() <= MAX_DECIMAL_EXPONENT
}

/// Emit a decimal as a JSON number
pub fn decimal_to_value(d: &BigDecimal) -> Value {
    if d.is_integer() {
        let whole = d.with_scale(0);
        if let Some(i) = whole.to_i64() {
            return Value::Number(i.into());
        }
        if let Some(u) = whole.to_u64() {
            return Value::Number(u.into());
        }
    }
    let text = canonical_decimal(d);
    match Number::from_str(&text) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}

/// Canonical text of a decimal: plain notation, no trailing fractional zeros
pub fn canonical_decimal(d: &BigDecimal) -> String {
    if d.is_integer() {
        d.with_scale(0).to_plain_string()
    } else {
        d.normalized().to_plain_string()
    }
}

/// Textual representation of any JSON value: strings verbatim, the rest as JSON
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
