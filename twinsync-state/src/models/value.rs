use std::fmt::Display;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum length in bytes of a string property
pub const MAX_STRING_LEN: usize = 64;

/// Type tag of a twin property
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("expected a {expected} value, got {found}")]
    WrongType {
        expected: ValueType,
        found: &'static str,
    },

    #[error("string is {actual} bytes long, max is {max}")]
    StringTooLong { max: usize, actual: usize },
}

/// A string no longer than [`MAX_STRING_LEN`] bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TwinString(String);

impl TwinString {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into();
        if value.len() > MAX_STRING_LEN {
            return Err(ValueError::StringTooLong {
                max: MAX_STRING_LEN,
                actual: value.len(),
            });
        }
        Ok(Self(value))
    }
}

impl Deref for TwinString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for TwinString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<&str> for TwinString {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for TwinString {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TwinString> for String {
    fn from(value: TwinString) -> Self {
        value.0
    }
}

/// The storage slot of a twin property.
///
/// The variant doubles as the type tag of the slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TwinValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(TwinString),
}

impl TwinValue {
    /// The initial value for a slot of type `ty`
    pub fn zero(ty: ValueType) -> Self {
        match ty {
            ValueType::Bool => TwinValue::Bool(false),
            ValueType::Int => TwinValue::Int(0),
            ValueType::Float => TwinValue::Float(0.0),
            ValueType::String => TwinValue::String(TwinString::default()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            TwinValue::Bool(_) => ValueType::Bool,
            TwinValue::Int(_) => ValueType::Int,
            TwinValue::Float(_) => ValueType::Float,
            TwinValue::String(_) => ValueType::String,
        }
    }

    /// Convert a JSON value into a value of type `ty`.
    ///
    /// Integers are truncated toward zero and saturate at the `i32` bounds,
    /// floats are narrowed to `f32`.
    pub fn from_json(ty: ValueType, json: &Value) -> Result<Self, ValueError> {
        let wrong_type = || ValueError::WrongType {
            expected: ty,
            found: json_kind(json),
        };

        match ty {
            ValueType::Bool => json.as_bool().map(TwinValue::Bool).ok_or_else(wrong_type),
            ValueType::Int => json
                .as_f64()
                .map(|n| TwinValue::Int(n as i32))
                .ok_or_else(wrong_type),
            ValueType::Float => json
                .as_f64()
                .map(|n| TwinValue::Float(n as f32))
                .ok_or_else(wrong_type),
            ValueType::String => {
                let s = json.as_str().ok_or_else(wrong_type)?;
                Ok(TwinValue::String(TwinString::new(s)?))
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TwinValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            TwinValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            TwinValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TwinValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for TwinValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TwinValue::Bool(b) => b.fmt(f),
            TwinValue::Int(n) => n.fmt(f),
            TwinValue::Float(n) => write!(f, "{n:.2}"),
            TwinValue::String(s) => s.fmt(f),
        }
    }
}

impl From<bool> for TwinValue {
    fn from(value: bool) -> Self {
        TwinValue::Bool(value)
    }
}

impl From<i32> for TwinValue {
    fn from(value: i32) -> Self {
        TwinValue::Int(value)
    }
}

impl From<f32> for TwinValue {
    fn from(value: f32) -> Self {
        TwinValue::Float(value)
    }
}

impl From<TwinString> for TwinValue {
    fn from(value: TwinString) -> Self {
        TwinValue::String(value)
    }
}

fn json_kind(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_converts_json_to_the_declared_type() {
        assert_eq!(
            TwinValue::from_json(ValueType::Bool, &json!(true)),
            Ok(TwinValue::Bool(true))
        );
        assert_eq!(
            TwinValue::from_json(ValueType::Int, &json!(42)),
            Ok(TwinValue::Int(42))
        );
        assert_eq!(
            TwinValue::from_json(ValueType::Float, &json!(1.5)),
            Ok(TwinValue::Float(1.5))
        );
        assert_eq!(
            TwinValue::from_json(ValueType::String, &json!("hello")),
            Ok(TwinValue::String(TwinString::new("hello").unwrap()))
        );
    }

    #[test]
    fn test_truncates_and_saturates_integers() {
        assert_eq!(
            TwinValue::from_json(ValueType::Int, &json!(7.9)),
            Ok(TwinValue::Int(7))
        );
        assert_eq!(
            TwinValue::from_json(ValueType::Int, &json!(-7.9)),
            Ok(TwinValue::Int(-7))
        );
        assert_eq!(
            TwinValue::from_json(ValueType::Int, &json!(1e12)),
            Ok(TwinValue::Int(i32::MAX))
        );
    }

    #[test]
    fn test_rejects_mismatched_json_types() {
        assert_eq!(
            TwinValue::from_json(ValueType::Bool, &json!(1)),
            Err(ValueError::WrongType {
                expected: ValueType::Bool,
                found: "number"
            })
        );
        assert_eq!(
            TwinValue::from_json(ValueType::Int, &json!("12")),
            Err(ValueError::WrongType {
                expected: ValueType::Int,
                found: "string"
            })
        );
    }

    #[test]
    fn test_rejects_strings_over_the_limit() {
        let long = "x".repeat(MAX_STRING_LEN + 1);
        assert_eq!(
            TwinValue::from_json(ValueType::String, &json!(long)),
            Err(ValueError::StringTooLong {
                max: MAX_STRING_LEN,
                actual: MAX_STRING_LEN + 1
            })
        );

        let exact = "x".repeat(MAX_STRING_LEN);
        assert!(TwinString::new(exact).is_ok());
    }

    #[test]
    fn test_deserializes_value_types_in_lowercase() {
        let ty: ValueType = serde_json::from_value(json!("float")).unwrap();
        assert_eq!(ty, ValueType::Float);
        assert_eq!(ValueType::String.to_string(), "string");
    }
}
