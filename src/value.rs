//! Field values and type coercion.
//!
//! Drivers hand back raw field values, usually as strings. A gateway's
//! `field_types()` maps each field to a type tag, and [`Coercions::cast_value`]
//! turns the raw value into the tagged type. Primitive tags are built in;
//! anything else is looked up among the coercion functions registered by
//! name, so there is no runtime lookup of types by name.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{GatewayError, Result};

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    DateTime(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Json(j) => write!(f, "{j}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Logical type tag attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    Integer,
    Float,
    Array,
    String,
    /// A named coercion registered in [`Coercions`].
    Class(String),
}

impl TypeTag {
    /// Parse a tag name. Names that are not primitive tags become
    /// [`TypeTag::Class`].
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bool" | "boolean" => TypeTag::Boolean,
            "int" | "integer" => TypeTag::Integer,
            "float" | "double" => TypeTag::Float,
            "array" => TypeTag::Array,
            "string" => TypeTag::String,
            _ => TypeTag::Class(s.to_string()),
        }
    }

    /// Convert tag to its canonical string representation.
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Array => "array",
            TypeTag::String => "string",
            TypeTag::Class(name) => name,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// A named single-argument coercion.
pub type CoercionFn = Arc<dyn Fn(&str) -> Result<Value> + Send + Sync>;

/// Registered coercion functions, keyed by lowercase tag name.
#[derive(Clone)]
pub struct Coercions {
    named: HashMap<String, CoercionFn>,
}

impl fmt::Debug for Coercions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.named.keys().collect();
        names.sort();
        f.debug_struct("Coercions").field("named", &names).finish()
    }
}

impl Default for Coercions {
    fn default() -> Self {
        let mut coercions = Self::empty();
        coercions.register("datetime", parse_datetime);
        coercions.register("json", parse_json);
        coercions
    }
}

impl Coercions {
    /// Create a registry without the built-in `datetime` and `json` coercions.
    pub fn empty() -> Self {
        Self {
            named: HashMap::new(),
        }
    }

    /// Register a coercion under `name`. Replaces any previous registration.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        self.named.insert(name.to_lowercase(), Arc::new(f));
    }

    /// Check whether a named coercion exists.
    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(&name.to_lowercase())
    }

    /// Coerce `value` to the type named by `tag`.
    ///
    /// Values that are not strings, and the `string` tag, pass through
    /// unchanged. Fails with [`GatewayError::InvalidType`] when the tag names
    /// no known type.
    pub fn cast_value(&self, value: Value, tag: &str) -> Result<Value> {
        self.cast(value, &TypeTag::from_name(tag))
    }

    /// Coerce `value` to an already parsed tag.
    pub fn cast(&self, value: Value, tag: &TypeTag) -> Result<Value> {
        // Unknown tags are rejected even for values that would pass through.
        let named = match tag {
            TypeTag::Class(name) => Some(
                self.named
                    .get(&name.to_lowercase())
                    .ok_or_else(|| GatewayError::InvalidType(name.clone()))?,
            ),
            _ => None,
        };

        let raw = match value {
            Value::String(s) => s,
            other => return Ok(other),
        };

        Ok(match tag {
            TypeTag::String => Value::String(raw),
            TypeTag::Boolean => Value::Bool(to_bool(&raw)),
            TypeTag::Integer => Value::Int(to_int(&raw)),
            TypeTag::Float => Value::Float(raw.trim().parse().unwrap_or(0.0)),
            TypeTag::Array => Value::Array(split_list(&raw)),
            TypeTag::Class(_) => match named {
                Some(f) => (**f)(&raw)?,
                None => Value::String(raw),
            },
        })
    }
}

fn to_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

fn to_int(raw: &str) -> i64 {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|x| x.trunc() as i64))
        .unwrap_or(0)
}

fn split_list(raw: &str) -> Vec<Value> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| Value::String(s.to_string())).collect()
}

fn parse_datetime(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Value::DateTime(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Value::DateTime(naive.and_utc()))
        .map_err(|e| GatewayError::InvalidType(format!("datetime '{raw}': {e}")))
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map(Value::Json)
        .map_err(|e| GatewayError::InvalidType(format!("json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast(value: impl Into<Value>, tag: &str) -> Result<Value> {
        Coercions::default().cast_value(value.into(), tag)
    }

    #[test]
    fn test_cast_integer() {
        assert_eq!(cast("5", "integer").unwrap(), Value::Int(5));
        assert_eq!(cast(" -12 ", "int").unwrap(), Value::Int(-12));
        assert_eq!(cast("3.9", "integer").unwrap(), Value::Int(3));
        assert_eq!(cast("abc", "integer").unwrap(), Value::Int(0));
    }

    #[test]
    fn test_cast_float() {
        assert_eq!(cast("2.5", "float").unwrap(), Value::Float(2.5));
        assert_eq!(cast("1", "double").unwrap(), Value::Float(1.0));
        assert_eq!(cast("nope", "float").unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_cast_boolean() {
        assert_eq!(cast("1", "boolean").unwrap(), Value::Bool(true));
        assert_eq!(cast("yes", "bool").unwrap(), Value::Bool(true));
        assert_eq!(cast("0", "boolean").unwrap(), Value::Bool(false));
        assert_eq!(cast("", "boolean").unwrap(), Value::Bool(false));
        assert_eq!(cast("FALSE", "boolean").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_cast_array_keeps_order() {
        assert_eq!(
            cast("a,b,c", "array").unwrap(),
            Value::Array(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(cast("", "array").unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_cast_string_is_noop() {
        assert_eq!(cast("5", "string").unwrap(), Value::String("5".into()));
    }

    #[test]
    fn test_non_string_input_is_unchanged() {
        assert_eq!(cast(5i64, "string").unwrap(), Value::Int(5));
        assert_eq!(cast(5i64, "boolean").unwrap(), Value::Int(5));
        assert_eq!(cast(true, "integer").unwrap(), Value::Bool(true));
        assert_eq!(
            Coercions::default()
                .cast_value(Value::Null, "array")
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_unknown_tag_is_invalid_type() {
        let err = cast("5", "money").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidType(ref name) if name == "money"));

        let err = cast(5i64, "money").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidType(_)));
    }

    #[test]
    fn test_cast_datetime() {
        let value = cast("2024-03-01 12:30:00", "datetime").unwrap();
        match value {
            Value::DateTime(dt) => assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:00+00:00"),
            other => panic!("expected datetime, got {other:?}"),
        }

        let value = cast("2024-03-01T12:30:00+02:00", "DateTime").unwrap();
        match value {
            Value::DateTime(dt) => assert_eq!(dt.to_rfc3339(), "2024-03-01T10:30:00+00:00"),
            other => panic!("expected datetime, got {other:?}"),
        }

        assert!(matches!(
            cast("yesterday", "datetime"),
            Err(GatewayError::InvalidType(_))
        ));
    }

    #[test]
    fn test_cast_json() {
        let value = cast(r#"{"a":[1,2]}"#, "json").unwrap();
        assert_eq!(value, Value::Json(serde_json::json!({"a": [1, 2]})));
    }

    #[test]
    fn test_register_custom_coercion() {
        let mut coercions = Coercions::empty();
        assert!(!coercions.contains("upper"));
        coercions.register("Upper", |raw| Ok(Value::String(raw.to_uppercase())));
        assert!(coercions.contains("upper"));

        let value = coercions.cast_value("abc".into(), "upper").unwrap();
        assert_eq!(value, Value::String("ABC".into()));
    }

    #[test]
    fn test_type_tag_parse() {
        assert_eq!("integer".parse::<TypeTag>().unwrap(), TypeTag::Integer);
        assert_eq!("Boolean".parse::<TypeTag>().unwrap(), TypeTag::Boolean);
        assert_eq!(
            "datetime".parse::<TypeTag>().unwrap(),
            TypeTag::Class("datetime".into())
        );
        assert_eq!(TypeTag::Float.to_string(), "float");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(
            Value::Array(vec!["a".into(), Value::Int(2)]).to_string(),
            "a,2"
        );
        assert_eq!(Value::Null.to_string(), "null");
    }
}
