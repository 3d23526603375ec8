//! Expression evaluator
//!
//! Resolves one schema string against a [`Document`]. The token stream of a
//! body is immutable and shared through the tokenizer cache; evaluation walks
//! it with a [`Cursor`], so a fold that finishes early simply moves the cursor
//! past its remaining arguments without evaluating them.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use super::interpolate::interpolate;
use super::token::{Token, Tokenizer};
use super::types::ValueType;
use crate::error::{BatchError, Result};
use crate::function::{Function, FunctionRegistry};
use crate::util::numeric::{decimal_to_value, parse_decimal, parse_integer};
use crate::util::Document;

/// Evaluates schema strings; cheap to share, holds no per-batch state
pub struct Evaluator {
    tokenizer: Tokenizer,
    functions: Arc<FunctionRegistry>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Arc::new(FunctionRegistry::with_builtins()))
    }
}

impl Evaluator {
    pub fn new(functions: Arc<FunctionRegistry>) -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            functions,
        }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Resolve a schema string (optional type prefix + body)
    pub fn eval(&self, schema: &str, doc: &Document) -> Result<Value> {
        let (ty, body) = ValueType::split_prefix(schema);
        let tokens = self.tokenizer.tokenize(body)?;
        trace!(schema, tokens = tokens.len(), "evaluating");

        let mut cursor = Cursor::new(body, &tokens);
        match cursor.next()? {
            Token::Path(path) => coerce(ty, doc.read(path)?),
            Token::Func(name) => {
                let value = self.call(name, ty, &mut cursor, doc)?;
                coerce(ty, value)
            }
            Token::Raw(text) => self.raw(ty, text, doc),
            Token::EndFunc => Err(cursor.error("unexpected ')'")),
        }
    }

    /// Evaluate a call whose `Func` token was just consumed
    fn call(
        &self,
        name: &str,
        target: Option<ValueType>,
        cursor: &mut Cursor<'_>,
        doc: &Document,
    ) -> Result<Value> {
        match self.functions.get(name)? {
            Function::Direct(function) => {
                let mut args = Vec::new();
                while !cursor.at_end_func()? {
                    args.push(self.argument(cursor, doc)?);
                }
                cursor.advance();
                trace!(function = name, args = args.len(), "invoke");
                function.invoke(target, args)
            }
            Function::Fold(function) => {
                let mut acc: Option<Value> = None;
                while !cursor.at_end_func()? {
                    let arg = self.argument(cursor, doc)?;
                    let step = function.step(target, arg, acc.take())?;
                    if step.done {
                        trace!(function = name, "fold finished early");
                        cursor.skip_call();
                        return Ok(step.value);
                    }
                    acc = Some(step.value);
                }
                cursor.advance();
                Ok(acc.unwrap_or(Value::Null))
            }
        }
    }

    fn argument(&self, cursor: &mut Cursor<'_>, doc: &Document) -> Result<Value> {
        match cursor.next()? {
            Token::Path(path) => doc.read(path),
            Token::Func(name) => self.call(name, None, cursor, doc),
            Token::Raw(text) => self.literal(text, doc),
            Token::EndFunc => Err(cursor.error("unexpected ')'")),
        }
    }

    /// Literal argument: decimal if it has a '.', else integer, else boolean, else text
    fn literal(&self, text: &str, doc: &Document) -> Result<Value> {
        let number = if text.contains('.') {
            parse_decimal(text)
        } else {
            parse_integer(text)
        };
        if let Some(d) = number {
            return Ok(decimal_to_value(&d));
        }
        if text.eq_ignore_ascii_case("true") {
            return Ok(Value::Bool(true));
        }
        if text.eq_ignore_ascii_case("false") {
            return Ok(Value::Bool(false));
        }
        self.interpolated(text, doc)
    }

    /// A top-level raw body
    fn raw(&self, ty: Option<ValueType>, text: &str, doc: &Document) -> Result<Value> {
        match ty {
            None | Some(ValueType::String) => self.interpolated(text, doc),
            Some(ValueType::Object) => {
                serde_json::from_str(text).map_err(|_| BatchError::cast(&Value::from(text), "object"))
            }
            Some(ty) if ty.is_array() => {
                let value = serde_json::from_str(text).unwrap_or_else(|_| Value::from(text));
                ty.coerce(value)
            }
            Some(ty) => ty.cast_scalar(&Value::from(text)),
        }
    }

    fn interpolated(&self, text: &str, doc: &Document) -> Result<Value> {
        let text = interpolate(text, |schema| self.eval(schema, doc))?;
        Ok(Value::String(text.into_owned()))
    }
}

fn coerce(ty: Option<ValueType>, value: Value) -> Result<Value> {
    match ty {
        Some(ty) => ty.coerce(value),
        None => Ok(value),
    }
}

/// Read position over an immutable token stream
struct Cursor<'a> {
    body: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(body: &'a str, tokens: &'a [Token]) -> Self {
        Self { body, tokens, pos: 0 }
    }

    fn error(&self, details: &str) -> BatchError {
        BatchError::syntax(self.body, self.pos, details)
    }

    fn next(&mut self) -> Result<&'a Token> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of expression"))?;
        self.pos += 1;
        Ok(token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Whether the next token closes the current call
    fn at_end_func(&self) -> Result<bool> {
        match self.tokens.get(self.pos) {
            Some(Token::EndFunc) => Ok(true),
            Some(_) => Ok(false),
            None => Err(self.error("unclosed call")),
        }
    }

    /// Move past the `EndFunc` matching the innermost open call
    fn skip_call(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            match token {
                Token::Func(_) => depth += 1,
                Token::EndFunc if depth == 0 => return,
                Token::EndFunc => depth -= 1,
                _ => {}
            }
        }
    }
}
