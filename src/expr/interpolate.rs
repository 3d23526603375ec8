//! Inline interpolation: `text @{schema}@ text`
//!
//! Grammar of one marker pair: `@{` contents `}@`, where contents never
//! contain `@{`. Markers therefore do not nest. From a given `@{` the pair
//! closes at the last `}@` before the next `@{`; an `@{` with no reachable
//! `}@` is ordinary text.

use std::borrow::Cow;

use serde_json::Value;

use crate::error::Result;
use crate::util::numeric::stringify;

const OPEN: &str = "@{";
const CLOSE: &str = "}@";

/// A piece of a raw string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// Contents of a marker pair, evaluated as a nested schema
    Expr(&'a str),
}

/// Split raw text into literal and expression segments
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut copied = 0;
    let mut search = 0;

    while let Some(rel) = text[search..].find(OPEN) {
        let open = search + rel;
        let body_start = open + OPEN.len();
        let next_open = text[body_start..]
            .find(OPEN)
            .map(|p| body_start + p)
            .unwrap_or(text.len());
        // A closing marker may end on the '@' that starts the next opener.
        let window_end = (next_open + 1).min(text.len());

        match text[body_start..window_end].rfind(CLOSE) {
            Some(rel_close) => {
                let close = body_start + rel_close;
                if copied < open {
                    out.push(Segment::Text(&text[copied..open]));
                }
                out.push(Segment::Expr(&text[body_start..close]));
                copied = close + CLOSE.len();
                search = copied;
            }
            None => search = next_open,
        }
        if search >= text.len() {
            break;
        }
    }

    if copied < text.len() {
        out.push(Segment::Text(&text[copied..]));
    }
    out
}

/// Substitute every marker pair with its stringified value
///
/// Returns the input unchanged (borrowed) when it holds no marker.
pub fn interpolate<'a, F>(text: &'a str, mut resolve: F) -> Result<Cow<'a, str>>
where
    F: FnMut(&str) -> Result<Value>,
{
    if !text.contains(OPEN) {
        return Ok(Cow::Borrowed(text));
    }

    let mut result = String::with_capacity(text.len() + 32);
    for segment in segments(text) {
        match segment {
            Segment::Text(t) => result.push_str(t),
            Segment::Expr(schema) => result.push_str(&stringify(&resolve(schema)?)),
        }
    }
    Ok(Cow::Owned(result))
}
