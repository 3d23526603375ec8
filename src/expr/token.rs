//! Expression tokenizer with caching
//!
//! Turns the body of one schema string (type prefix already stripped) into a
//! flat token stream:
//!
//! ```text
//! $.responses[0].status          → [Path]
//! sum($.a, max(1, $.b), 2)       → [Func(sum), Path, Func(max), Raw, Path, EndFunc, Raw, EndFunc]
//! Hello @{$.original.body.name}@ → [Raw]
//! ```
//!
//! Interpolation markers are left inside `Raw` text; they are expanded at
//! evaluation time.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{BatchError, Result};

/// Function name immediately followed by the argument-opening parenthesis
static CALL_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\(").expect("valid call regex"));

/// One lexical unit of an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// JSONPath query against the context
    Path(String),
    /// Start of a call; arguments follow until the matching `EndFunc`
    Func(String),
    /// Closes the nearest open call
    EndFunc,
    /// Literal text
    Raw(String),
}

/// Tokenizer with a per-body cache
///
/// Templates are immutable and evaluated repeatedly, so each distinct body is
/// lexed once and shared.
pub struct Tokenizer {
    cache: DashMap<String, Arc<[Token]>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Tokenize a body, reusing a cached stream when available
    pub fn tokenize(&self, body: &str) -> Result<Arc<[Token]>> {
        if let Some(cached) = self.cache.get(body) {
            return Ok(Arc::clone(&cached));
        }
        let tokens: Arc<[Token]> = tokenize(body)?.into();
        self.cache.insert(body.to_string(), Arc::clone(&tokens));
        Ok(tokens)
    }

    /// Number of cached bodies
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Tokenize a body without caching
pub fn tokenize(body: &str) -> Result<Vec<Token>> {
    if body.starts_with('$') {
        return Ok(vec![Token::Path(body.to_string())]);
    }
    if !CALL_START.is_match(body) {
        return Ok(vec![Token::Raw(body.to_string())]);
    }

    let mut lexer = Lexer {
        input: body,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.call()?;
    lexer.skip_whitespace();
    if lexer.pos < body.len() {
        return Err(BatchError::syntax(
            body,
            lexer.pos,
            "unexpected input after the closing ')'",
        ));
    }
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, details: impl Into<String>) -> BatchError {
        BatchError::syntax(self.input, self.pos, details)
    }

    /// `name(` args `)`; the cursor sits on the first character of the name
    fn call(&mut self) -> Result<()> {
        let open = self.rest().find('(').ok_or_else(|| self.error("expected '('"))?;
        let name = self.rest()[..open].to_string();
        self.pos += open + 1;
        self.tokens.push(Token::Func(name.clone()));

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error(format!("unclosed call to '{name}'"))),
                Some(')') => {
                    self.pos += 1;
                    self.tokens.push(Token::EndFunc);
                    return Ok(());
                }
                Some(_) => self.argument()?,
            }

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {}
                None => return Err(self.error(format!("unclosed call to '{name}'"))),
                Some(c) => return Err(self.error(format!("expected ',' or ')' but found '{c}'"))),
            }
        }
    }

    fn argument(&mut self) -> Result<()> {
        match self.peek() {
            Some('$') => self.path(),
            Some(q @ ('"' | '\'')) => self.quoted(q),
            Some(',') => Err(self.error("empty argument")),
            _ if CALL_START.is_match(self.rest()) => self.call(),
            _ => self.bare(),
        }
    }

    /// Path argument: ends at a top-level ',' or ')'
    fn path(&mut self) -> Result<()> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (offset, ch) in self.rest().char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                '\'' | '"' => quote = Some(ch),
                '[' | '(' => depth += 1,
                ']' | ')' if depth > 0 => depth -= 1,
                ']' => {
                    self.pos = start + offset;
                    return Err(self.error("unbalanced ']' in path"));
                }
                ',' | ')' if depth == 0 => {
                    self.pos = start + offset;
                    self.tokens.push(Token::Path(self.input[start..self.pos].trim_end().to_string()));
                    return Ok(());
                }
                _ => {}
            }
        }

        self.pos = self.input.len();
        if depth > 0 || quote.is_some() {
            return Err(self.error("unclosed bracket or quote in path"));
        }
        Err(self.error("unclosed call: path argument runs to end of input"))
    }

    /// Quoted literal; the quotes are dropped and `\` escapes the next character
    fn quoted(&mut self, q: char) -> Result<()> {
        let start = self.pos;
        self.pos += q.len_utf8();
        let mut text = String::new();
        let mut escaped = false;

        for (offset, ch) in self.rest().char_indices() {
            if escaped {
                text.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                self.pos += offset + ch.len_utf8();
                self.tokens.push(Token::Raw(text));
                return Ok(());
            } else {
                text.push(ch);
            }
        }

        self.pos = start;
        Err(self.error(format!("unterminated {q}-quoted argument")))
    }

    /// Bare literal: ends at ',' or ')', skipping over `@{ ... }@` markers
    fn bare(&mut self) -> Result<()> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut i = self.pos;

        while i < bytes.len() {
            match bytes[i] {
                b'@' if bytes.get(i + 1) == Some(&b'{') => {
                    match self.input[i + 2..].find("}@") {
                        Some(close) => i += 2 + close + 2,
                        None => i += 2,
                    }
                }
                b',' | b')' => break,
                b'(' => {
                    self.pos = i;
                    return Err(self.error("unexpected '(' in literal argument; quote it"));
                }
                _ => i += 1,
            }
        }

        let text = self.input[start..i].trim_end();
        if text.is_empty() {
            self.pos = start;
            return Err(self.error("empty argument"));
        }
        self.pos = i;
        self.tokens.push(Token::Raw(text.to_string()));
        Ok(())
    }
}
