//! Builtin function catalog

use std::cmp::Ordering;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde_json::Value;

use super::{DirectFunction, FoldFunction, FoldStep, Function};
use crate::error::{BatchError, Result};
use crate::expr::ValueType;
use crate::util::jsonpath::value_kind;
use crate::util::numeric::{decimal_to_value, stringify, to_boolean, to_decimal};

/// Every builtin, ready to be inserted into a registry
pub fn builtins() -> Vec<Function> {
    vec![
        Function::Fold(Arc::new(Sum)),
        Function::Fold(Arc::new(Extreme::MIN)),
        Function::Fold(Arc::new(Extreme::MAX)),
        Function::Fold(Arc::new(Logical::AND)),
        Function::Fold(Arc::new(Logical::OR)),
        Function::Fold(Arc::new(Coalesce)),
        Function::Direct(Arc::new(Average("average"))),
        Function::Direct(Arc::new(Average("avg"))),
        Function::Direct(Arc::new(Not)),
        Function::Direct(Arc::new(Concat)),
        Function::Direct(Arc::new(Len)),
        Function::Direct(Arc::new(Compare::new("eq", |o| o == Ordering::Equal))),
        Function::Direct(Arc::new(Compare::new("ne", |o| o != Ordering::Equal))),
        Function::Direct(Arc::new(Compare::new("gt", |o| o == Ordering::Greater))),
        Function::Direct(Arc::new(Compare::new("gte", |o| o != Ordering::Less))),
        Function::Direct(Arc::new(Compare::new("lt", |o| o == Ordering::Less))),
        Function::Direct(Arc::new(Compare::new("lte", |o| o != Ordering::Greater))),
    ]
}

fn argument_error(function: &str, reason: impl Into<String>) -> BatchError {
    BatchError::FunctionArgument {
        function: function.to_string(),
        reason: reason.into(),
    }
}

/// Numeric operands of an argument: sequences are flattened, nulls skipped
fn numbers(function: &str, arg: &Value, out: &mut Vec<BigDecimal>) -> Result<()> {
    match arg {
        Value::Null => Ok(()),
        Value::Array(items) => items.iter().try_for_each(|item| numbers(function, item, out)),
        other => {
            let d = to_decimal(other)
                .ok_or_else(|| argument_error(function, format!("{other} is not numeric")))?;
            out.push(d);
            Ok(())
        }
    }
}

/// Accumulator as a decimal; `None` and `null` mean "nothing yet"
fn accumulated(function: &str, acc: Option<Value>) -> Result<Option<BigDecimal>> {
    match acc {
        None | Some(Value::Null) => Ok(None),
        Some(v) => to_decimal(&v)
            .map(Some)
            .ok_or_else(|| argument_error(function, format!("accumulator {v} is not numeric"))),
    }
}

fn exactly<const N: usize>(function: &str, args: Vec<Value>) -> Result<[Value; N]> {
    let count = args.len();
    args.try_into()
        .map_err(|_| argument_error(function, format!("expected {N} argument(s), got {count}")))
}

// ═══════════════════════════════════════════
// FOLDS
// ═══════════════════════════════════════════

struct Sum;

impl FoldFunction for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn step(&self, _target: Option<ValueType>, arg: Value, acc: Option<Value>) -> Result<FoldStep> {
        let mut operands = Vec::new();
        numbers(self.name(), &arg, &mut operands)?;
        let total = operands
            .into_iter()
            .fold(accumulated(self.name(), acc)?, |total, d| match total {
                Some(t) => Some(t + d),
                None => Some(d),
            });
        Ok(FoldStep::more(total.map_or(Value::Null, |t| decimal_to_value(&t))))
    }
}

struct Extreme {
    name: &'static str,
    keep: Ordering,
}

impl Extreme {
    const MIN: Self = Self {
        name: "min",
        keep: Ordering::Less,
    };
    const MAX: Self = Self {
        name: "max",
        keep: Ordering::Greater,
    };
}

impl FoldFunction for Extreme {
    fn name(&self) -> &str {
        self.name
    }

    fn step(&self, _target: Option<ValueType>, arg: Value, acc: Option<Value>) -> Result<FoldStep> {
        let mut operands = Vec::new();
        numbers(self.name, &arg, &mut operands)?;
        let best = operands
            .into_iter()
            .fold(accumulated(self.name, acc)?, |best, d| match best {
                Some(b) if d.cmp(&b) != self.keep => Some(b),
                _ => Some(d),
            });
        Ok(FoldStep::more(best.map_or(Value::Null, |b| decimal_to_value(&b))))
    }
}

/// `and` stops on the first false argument, `or` on the first true one
struct Logical {
    name: &'static str,
    stop_on: bool,
}

impl Logical {
    const AND: Self = Self {
        name: "and",
        stop_on: false,
    };
    const OR: Self = Self {
        name: "or",
        stop_on: true,
    };
}

impl FoldFunction for Logical {
    fn name(&self) -> &str {
        self.name
    }

    fn step(&self, _target: Option<ValueType>, arg: Value, _acc: Option<Value>) -> Result<FoldStep> {
        let truth = match &arg {
            Value::Null => false,
            other => to_boolean(other)
                .ok_or_else(|| argument_error(self.name, format!("{other} is not boolean-like")))?,
        };
        if truth == self.stop_on {
            Ok(FoldStep::done(Value::Bool(truth)))
        } else {
            Ok(FoldStep::more(Value::Bool(truth)))
        }
    }
}

struct Coalesce;

impl FoldFunction for Coalesce {
    fn name(&self) -> &str {
        "coalesce"
    }

    fn step(&self, _target: Option<ValueType>, arg: Value, _acc: Option<Value>) -> Result<FoldStep> {
        if arg.is_null() {
            Ok(FoldStep::more(Value::Null))
        } else {
            Ok(FoldStep::done(arg))
        }
    }
}

// ═══════════════════════════════════════════
// DIRECT
// ═══════════════════════════════════════════

struct Average(&'static str);

impl DirectFunction for Average {
    fn name(&self) -> &str {
        self.0
    }

    fn invoke(&self, _target: Option<ValueType>, args: Vec<Value>) -> Result<Value> {
        let mut operands = Vec::new();
        for arg in &args {
            numbers(self.0, arg, &mut operands)?;
        }
        if operands.is_empty() {
            return Ok(Value::Null);
        }
        let count = BigDecimal::from(operands.len() as u64);
        let total: BigDecimal = operands.into_iter().sum();
        Ok(decimal_to_value(&(total / count)))
    }
}

struct Not;

impl DirectFunction for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn invoke(&self, _target: Option<ValueType>, args: Vec<Value>) -> Result<Value> {
        let [arg] = exactly::<1>(self.name(), args)?;
        let truth = match &arg {
            Value::Null => false,
            other => to_boolean(other)
                .ok_or_else(|| argument_error(self.name(), format!("{other} is not boolean-like")))?,
        };
        Ok(Value::Bool(!truth))
    }
}

struct Concat;

impl DirectFunction for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn invoke(&self, _target: Option<ValueType>, args: Vec<Value>) -> Result<Value> {
        Ok(Value::String(args.iter().map(stringify).collect()))
    }
}

struct Len;

impl DirectFunction for Len {
    fn name(&self) -> &str {
        "len"
    }

    fn invoke(&self, _target: Option<ValueType>, args: Vec<Value>) -> Result<Value> {
        let [arg] = exactly::<1>(self.name(), args)?;
        let len = match &arg {
            Value::Null => 0,
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::String(s) => s.chars().count(),
            other => {
                return Err(argument_error(
                    self.name(),
                    format!("{} has no length", value_kind(other)),
                ))
            }
        };
        Ok(Value::from(len))
    }
}

/// Binary comparison
///
/// Numeric-like operands compare as decimals, two strings compare
/// lexically; any other pair can only be tested for equality.
struct Compare {
    name: &'static str,
    accept: fn(Ordering) -> bool,
}

impl Compare {
    fn new(name: &'static str, accept: fn(Ordering) -> bool) -> Self {
        Self { name, accept }
    }

    fn equality_only(&self) -> bool {
        matches!(self.name, "eq" | "ne")
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (to_decimal(left), to_decimal(right)) {
        return Some(l.cmp(&r));
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

impl DirectFunction for Compare {
    fn name(&self) -> &str {
        self.name
    }

    fn invoke(&self, _target: Option<ValueType>, args: Vec<Value>) -> Result<Value> {
        let [left, right] = exactly::<2>(self.name, args)?;
        let ordering = match order(&left, &right) {
            Some(ordering) => ordering,
            None if self.equality_only() => {
                if left == right {
                    Ordering::Equal
                } else {
                    Ordering::Less
                }
            }
            None => {
                return Err(argument_error(
                    self.name,
                    format!(
                        "cannot order {} and {}",
                        value_kind(&left),
                        value_kind(&right)
                    ),
                ))
            }
        };
        Ok(Value::Bool((self.accept)(ordering)))
    }
}
