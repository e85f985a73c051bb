//! The value universe
//!
//! [`Datum`] is what a single-slot observable can hold; [`Instance`] is what
//! a record field can be; [`Payload`] is what an emission carries. Equality
//! on composite data is reference identity (two handles to the same
//! instance), matching the layer's identity-based change detection.

use serde_json::Value as Json;

use rivus_core::{EventKind, Listener, RivusResult, Scalar};

use crate::{Collection, OneOf, Record, Value};

/// A value held by a single slot: a scalar or a composite handle
#[derive(Clone, Debug)]
pub enum Datum {
    Scalar(Scalar),
    Record(Record),
    Union(OneOf),
    Collection(Collection),
}

impl Datum {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Datum::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Datum::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_number)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Scalar::as_bool)
    }

    pub fn as_text(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_text)
    }

    /// Plain-data representation. Composite data delegates to its own
    /// `serialize`, so a non-serializable composite fails here too.
    pub fn serialize(&self) -> RivusResult<Json> {
        match self {
            Datum::Scalar(s) => Ok(s.to_json()),
            Datum::Record(r) => r.serialize(),
            Datum::Union(u) => u.serialize(),
            Datum::Collection(c) => c.serialize(),
        }
    }
}

/// Scalars compare by value, composites by reference identity
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Scalar(a), Datum::Scalar(b)) => a == b,
            (Datum::Record(a), Datum::Record(b)) => a.ptr_eq(b),
            (Datum::Union(a), Datum::Union(b)) => a.ptr_eq(b),
            (Datum::Collection(a), Datum::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<f64> for Datum {
    fn from(n: f64) -> Self {
        Datum::Scalar(Scalar::Number(n))
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Scalar(Scalar::Bool(b))
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Scalar(Scalar::from(s))
    }
}

impl From<Record> for Datum {
    fn from(r: Record) -> Self {
        Datum::Record(r)
    }
}

/// What an emission carries: a single datum or a membership snapshot
#[derive(Clone, Debug)]
pub enum Payload {
    Datum(Datum),
    Members(Vec<Record>),
}

impl Payload {
    pub fn member(record: Record) -> Payload {
        Payload::Datum(Datum::Record(record))
    }

    pub fn as_datum(&self) -> Option<&Datum> {
        match self {
            Payload::Datum(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Record> {
        self.as_datum().and_then(Datum::as_record)
    }

    pub fn as_members(&self) -> Option<&[Record]> {
        match self {
            Payload::Members(m) => Some(m),
            _ => None,
        }
    }
}

/// A record field: any observable instance the schema can declare
#[derive(Clone, Debug)]
pub enum Instance {
    Value(Value),
    Collection(Collection),
    Record(Record),
    Union(OneOf),
}

impl Instance {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Instance::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Instance::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Instance::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&OneOf> {
        match self {
            Instance::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn on(&self, kind: EventKind, listener: Listener<Payload>) {
        match self {
            Instance::Value(v) => {
                v.on(kind, listener);
            }
            Instance::Collection(c) => {
                c.on(kind, listener);
            }
            Instance::Record(r) => {
                r.on(kind, listener);
            }
            Instance::Union(u) => {
                u.on(kind, listener);
            }
        }
    }

    pub fn off(&self, kind: EventKind, listener: &Listener<Payload>) {
        match self {
            Instance::Value(v) => {
                v.off(kind, listener);
            }
            Instance::Collection(c) => {
                c.off(kind, listener);
            }
            Instance::Record(r) => {
                r.off(kind, listener);
            }
            Instance::Union(u) => {
                u.off(kind, listener);
            }
        }
    }

    /// Whether `serialize` is permitted on this instance
    pub fn is_serializable(&self) -> bool {
        match self {
            Instance::Value(v) => v.is_serializable(),
            Instance::Collection(c) => c.is_serializable(),
            Instance::Record(r) => r.is_serializable(),
            // A union defers to its payload
            Instance::Union(u) => u.value().is_serializable(),
        }
    }

    pub fn serialize(&self) -> RivusResult<Json> {
        match self {
            Instance::Value(v) => v.serialize(),
            Instance::Collection(c) => c.serialize(),
            Instance::Record(r) => r.serialize(),
            Instance::Union(u) => u.serialize(),
        }
    }
}
