//! Primitive values carried by reflected properties
//!
//! Only the closed set of primitive kinds round-trips through a snapshot.
//! Anything else a component exposes is invisible to serialization.

use crate::error::{ReflectError, Result};
use serde_json::Number;
use std::fmt;

/// A primitive property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit integer
    Int(i32),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
}

/// The static kind of a primitive value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Double,
    Bool,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
        }
    }

    /// Convert into `kind`, allowing only lossless numeric widening
    pub fn coerce(self, kind: ValueKind) -> Result<Value> {
        match (self, kind) {
            (v, k) if v.kind() == k => Ok(v),
            (Value::Int(v), ValueKind::Double) => Ok(Value::Double(v as f64)),
            (Value::Int(v), ValueKind::Float) => Ok(Value::Float(v as f32)),
            (Value::Float(v), ValueKind::Double) => Ok(Value::Double(v as f64)),
            (v, k) => Err(ReflectError::parse(k, v.kind().to_string())),
        }
    }

    /// Read a JSON literal as the given kind
    ///
    /// Integers reject fractional and out-of-range numbers; floats accept any
    /// JSON number. Strings are never parsed into numbers.
    pub fn from_json(kind: ValueKind, json: &serde_json::Value) -> Result<Value> {
        let mismatch = || ReflectError::parse(kind, json.to_string());
        match kind {
            ValueKind::Int => json
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Int)
                .ok_or_else(mismatch),
            ValueKind::Float => json.as_f64().map(|v| Value::Float(v as f32)).ok_or_else(mismatch),
            ValueKind::Double => json.as_f64().map(Value::Double).ok_or_else(mismatch),
            ValueKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
            ValueKind::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
        }
    }

    /// Convert to a JSON literal
    ///
    /// Non-finite floats have no JSON form and are rejected.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let json = match self {
            Value::Int(v) => serde_json::Value::from(*v),
            // Shortest f32 text, not the widened f64 digits
            Value::Float(v) => v
                .to_string()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(serde_json::Value::Number)
                .ok_or_else(|| ReflectError::parse(ValueKind::Float, v.to_string()))?,
            Value::Double(v) => Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .ok_or_else(|| ReflectError::parse(ValueKind::Double, v.to_string()))?,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::String(v) => serde_json::Value::String(v.clone()),
        };
        Ok(json)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
        }
    }
}

/// Rust types that map onto a primitive [`Value`]
pub trait Primitive: Sized + 'static {
    /// The kind this type maps to
    const KIND: ValueKind;

    /// Wrap into a value
    fn into_value(self) -> Value;

    /// Unwrap from a value of the matching kind
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! impl_primitive {
    ($ty:ty, $kind:ident) => {
        impl Primitive for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                Value::$kind(self)
            }

            fn from_value(value: Value) -> Result<Self> {
                match value.coerce(ValueKind::$kind)? {
                    Value::$kind(v) => Ok(v),
                    other => Err(ReflectError::parse(ValueKind::$kind, other.kind().to_string())),
                }
            }
        }
    };
}

impl_primitive!(i32, Int);
impl_primitive!(f32, Float);
impl_primitive!(f64, Double);
impl_primitive!(bool, Bool);
impl_primitive!(String, String);
