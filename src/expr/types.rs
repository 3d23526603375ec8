//! Target types and casting rules
//!
//! A schema string may start with a type prefix (`int `, `str[] `, ...). The
//! prefix is matched case-sensitively, including its trailing space, so a
//! path or literal that merely begins with similar text is left alone.

use std::fmt;

use serde_json::Value;

use crate::error::{BatchError, Result};
use crate::util::numeric::{canonical_decimal, decimal_to_value, stringify, to_boolean, to_decimal, to_integer};

/// A cast target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    StringArray,
    IntegerArray,
    NumberArray,
    BooleanArray,
    ObjectArray,
}

/// Recognized spellings, short and long form for every type
const PREFIXES: &[(&str, ValueType)] = &[
    ("str ", ValueType::String),
    ("string ", ValueType::String),
    ("int ", ValueType::Integer),
    ("integer ", ValueType::Integer),
    ("num ", ValueType::Number),
    ("number ", ValueType::Number),
    ("bool ", ValueType::Boolean),
    ("boolean ", ValueType::Boolean),
    ("obj ", ValueType::Object),
    ("object ", ValueType::Object),
    ("str[] ", ValueType::StringArray),
    ("string[] ", ValueType::StringArray),
    ("int[] ", ValueType::IntegerArray),
    ("integer[] ", ValueType::IntegerArray),
    ("num[] ", ValueType::NumberArray),
    ("number[] ", ValueType::NumberArray),
    ("bool[] ", ValueType::BooleanArray),
    ("boolean[] ", ValueType::BooleanArray),
    ("obj[] ", ValueType::ObjectArray),
    ("object[] ", ValueType::ObjectArray),
];

impl ValueType {
    /// Split a schema string into its type prefix (if any) and the trimmed body
    pub fn split_prefix(schema: &str) -> (Option<ValueType>, &str) {
        PREFIXES
            .iter()
            .filter(|(prefix, _)| schema.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, ty)| (Some(*ty), schema[prefix.len()..].trim()))
            .unwrap_or((None, schema.trim()))
    }

    pub fn is_array(self) -> bool {
        self.element_type() != self
    }

    /// The scalar type of array elements (scalars map to themselves)
    pub fn element_type(self) -> ValueType {
        match self {
            Self::StringArray => Self::String,
            Self::IntegerArray => Self::Integer,
            Self::NumberArray => Self::Number,
            Self::BooleanArray => Self::Boolean,
            Self::ObjectArray => Self::Object,
            scalar => scalar,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::StringArray => "string[]",
            Self::IntegerArray => "integer[]",
            Self::NumberArray => "number[]",
            Self::BooleanArray => "boolean[]",
            Self::ObjectArray => "object[]",
        }
    }

    /// Cast one value to this type's element type
    ///
    /// `null` only survives an object cast; every other scalar cast of `null` fails.
    pub fn cast_scalar(self, value: &Value) -> Result<Value> {
        let target = self.element_type();
        let cast = match target {
            Self::String => match value {
                Value::Null => None,
                Value::Number(n) => Some(Value::String(
                    to_decimal(value)
                        .map(|d| canonical_decimal(&d))
                        .unwrap_or_else(|| n.to_string()),
                )),
                other => Some(Value::String(stringify(other))),
            },
            Self::Integer => to_integer(value).map(|d| decimal_to_value(&d)),
            Self::Number => to_decimal(value).map(|d| decimal_to_value(&d)),
            Self::Boolean => to_boolean(value).map(Value::Bool),
            _ => Some(value.clone()),
        };
        cast.ok_or_else(|| BatchError::cast(value, target.name()))
    }

    /// Coerce a resolved value to this type
    ///
    /// - `null` is returned unchanged.
    /// - scalar type: a sequence contributes its first element, then casts; an
    ///   empty sequence yields `null`.
    /// - array type: a scalar is wrapped, then every non-null element is cast.
    pub fn coerce(self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if self.is_array() {
            let items = match value {
                Value::Array(items) => items,
                single => vec![single],
            };
            return items
                .into_iter()
                .map(|item| match item {
                    Value::Null => Ok(Value::Null),
                    item => self.cast_scalar(&item),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array);
        }
        match value {
            Value::Array(items) => match items.into_iter().next() {
                None | Some(Value::Null) => Ok(Value::Null),
                Some(first) => self.cast_scalar(&first),
            },
            other => self.cast_scalar(&other),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
