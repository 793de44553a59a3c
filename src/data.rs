use std::fmt;

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde_json::Value as JsonValue;

/// A single cell of a [`crate::frame::Frame`]. Missing cells are `None` at the
/// row level, so no variant stands for "empty".
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Geometry(JsonValue),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Value::Geometry(g) => g.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Raw delimited-text field to cell. Empty fields are missing.
pub fn parse_cell(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        None
    } else {
        Some(Value::Text(raw.to_string()))
    }
}

/// GeoJSON property to cell. Nested objects keep their JSON text.
pub fn json_to_cell(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => parse_cell(s),
        JsonValue::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        JsonValue::Bool(b) => Some(Value::Text(b.to_string())),
        other => Some(Value::Text(other.to_string())),
    }
}

/// Best-effort integer parse: accepts `2020`, ` 2020 ` and `2020.0`.
pub fn coerce_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    let parsed = coerce_float(trimmed)?;
    (parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64).then_some(parsed as i64)
}

/// Best-effort float parse; non-finite results count as failures.
pub fn coerce_float(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Rounds to one decimal place, half away from zero, through an exact decimal
/// so values like `2.25` do not fall victim to binary representation.
pub fn round_to_tenth(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
