//! Function plugins
//!
//! A function is looked up by name from a call token and comes in one of two
//! shapes:
//!
//! | Kind | Receives | Stops |
//! |------|----------|-------|
//! | [`DirectFunction`] | every argument, already evaluated | never |
//! | [`FoldFunction`] | one argument at a time plus the accumulator | as soon as a step reports `done` |
//!
//! A fold that reports `done` prevents the remaining argument expressions
//! from being evaluated at all.

mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{BatchError, Result};
use crate::expr::ValueType;

pub use builtin::builtins;

/// A function evaluated over its complete argument list
pub trait DirectFunction: Send + Sync {
    fn name(&self) -> &str;

    /// `target` is the type prefix of the enclosing schema (only for the outermost call)
    fn invoke(&self, target: Option<ValueType>, args: Vec<Value>) -> Result<Value>;
}

/// A function folded over its arguments, able to finish early
pub trait FoldFunction: Send + Sync {
    fn name(&self) -> &str;

    /// Combine one argument into the accumulator (`None` before the first step)
    fn step(&self, target: Option<ValueType>, arg: Value, acc: Option<Value>) -> Result<FoldStep>;
}

/// Outcome of one fold step
#[derive(Debug, Clone, PartialEq)]
pub struct FoldStep {
    pub value: Value,
    pub done: bool,
}

impl FoldStep {
    /// Keep folding with this accumulator
    pub fn more(value: Value) -> Self {
        Self { value, done: false }
    }

    /// Stop here; `value` is the result
    pub fn done(value: Value) -> Self {
        Self { value, done: true }
    }
}

/// A registered function of either kind
#[derive(Clone)]
pub enum Function {
    Direct(Arc<dyn DirectFunction>),
    Fold(Arc<dyn FoldFunction>),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Direct(f) => f.name(),
            Function::Fold(f) => f.name(),
        }
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Direct(func) => write!(f, "Direct({})", func.name()),
            Function::Fold(func) => write!(f, "Fold({})", func.name()),
        }
    }
}

/// Name → function table, fixed once evaluation starts
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin catalog
    pub fn with_builtins() -> Self {
        let functions = builtins()
            .into_iter()
            .map(|f| (f.name().to_string(), f))
            .collect();
        Self { functions }
    }

    /// Add a function; names must be unique
    pub fn register(&mut self, function: Function) -> Result<()> {
        let name = function.name().to_string();
        if self.functions.contains_key(&name) {
            return Err(BatchError::DuplicateFunction { name });
        }
        self.functions.insert(name, function);
        Ok(())
    }

    pub fn register_direct(&mut self, function: impl DirectFunction + 'static) -> Result<()> {
        self.register(Function::Direct(Arc::new(function)))
    }

    pub fn register_fold(&mut self, function: impl FoldFunction + 'static) -> Result<()> {
        self.register(Function::Fold(Arc::new(function)))
    }

    /// Look a function up by name
    pub fn get(&self, name: &str) -> Result<&Function> {
        self.functions
            .get(name)
            .ok_or_else(|| BatchError::UnsupportedFunction {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
