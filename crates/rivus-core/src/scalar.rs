//! Primitive scalar kinds and values
//!
//! The closed set of primitive kinds a single-slot observable can be declared
//! over, each with a defined zero value. Raw JSON input of the matching shape
//! passes through unchanged; absent or mismatched input substitutes the zero
//! value.

use serde_json::Value as Json;

/// Primitive kind classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Number,
    Bool,
    Text,
}

impl PrimitiveKind {
    /// The kind's zero value: 0, false, or empty text
    pub fn zero(self) -> Scalar {
        match self {
            PrimitiveKind::Number => Scalar::Number(0.0),
            PrimitiveKind::Bool => Scalar::Bool(false),
            PrimitiveKind::Text => Scalar::Text(String::new()),
        }
    }

    /// Construction rule: present input of the matching shape passes through,
    /// anything else substitutes the zero value.
    pub fn from_json(self, raw: Option<&Json>) -> Scalar {
        match (self, raw) {
            (PrimitiveKind::Number, Some(Json::Number(n))) => {
                Scalar::Number(n.as_f64().unwrap_or(0.0))
            }
            (PrimitiveKind::Bool, Some(Json::Bool(b))) => Scalar::Bool(*b),
            (PrimitiveKind::Text, Some(Json::String(s))) => Scalar::Text(s.clone()),
            _ => self.zero(),
        }
    }
}

/// A primitive value held by a single-slot observable
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Scalar::Number(_) => PrimitiveKind::Number,
            Scalar::Bool(_) => PrimitiveKind::Bool,
            Scalar::Text(_) => PrimitiveKind::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Plain-data representation. Integral numbers serialize as JSON
    /// integers so that ids and counts round-trip without a float suffix.
    pub fn to_json(&self) -> Json {
        match self {
            Scalar::Number(n) => number_to_json(*n),
            Scalar::Bool(b) => Json::Bool(*b),
            Scalar::Text(s) => Json::String(s.clone()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_owned())
    }
}

fn number_to_json(n: f64) -> Json {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Json::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Json::Number)
            .unwrap_or(Json::Null)
    }
}
