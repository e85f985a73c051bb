//! Identity types for RIVUS records
//!
//! A record id either arrives in raw data (text or integer, preserved exactly
//! through serialization) or is generated: 32 characters drawn from a fixed
//! alphabet, effectively collision-free for practical collection sizes.
//! Generation goes through the `IdSource` capability so tests can supply
//! deterministic ids.

use std::fmt;
use std::rc::Rc;

use rand::Rng;
use serde_json::Value as Json;

/// Alphabet for generated identifiers
pub const ID_ALPHABET: &[u8] = b"ABCDEF0123456789";

/// Length of generated identifiers
pub const ID_LEN: usize = 32;

/// Record identity - propagated from raw data or generated
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ObjectId {
    /// Text identifier (every generated id is text)
    Text(Rc<str>),
    /// Integer identifier propagated from raw data
    Int(i64),
}

impl ObjectId {
    /// Extract an id from raw input, preserving its JSON shape.
    /// Non-id-shaped input yields `None` and the caller generates a fresh id.
    pub fn from_json(raw: &Json) -> Option<ObjectId> {
        match raw {
            Json::String(s) => Some(ObjectId::Text(Rc::from(s.as_str()))),
            Json::Number(n) => n.as_i64().map(ObjectId::Int),
            _ => None,
        }
    }

    /// Plain-data representation, bit-exact with the shape the id arrived in
    pub fn to_json(&self) -> Json {
        match self {
            ObjectId::Text(s) => Json::String(s.to_string()),
            ObjectId::Int(n) => Json::from(*n),
        }
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId::Text(Rc::from(s))
    }
}

impl From<i64> for ObjectId {
    fn from(n: i64) -> Self {
        ObjectId::Int(n)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Text(s) => write!(f, "Id({s})"),
            ObjectId::Int(n) => write!(f, "Id({n})"),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Text(s) => write!(f, "{s}"),
            ObjectId::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Id-generation capability, injectable so tests can supply deterministic ids
pub trait IdSource {
    fn next_id(&self) -> ObjectId;
}

/// Shared handle to an id source
pub type SharedIdSource = Rc<dyn IdSource>;

/// Default source: 32 characters drawn uniformly from [`ID_ALPHABET`].
/// Not cryptographically unique, just wide enough to not collide in practice.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> ObjectId {
        let mut rng = rand::thread_rng();
        let mut buf = String::with_capacity(ID_LEN);
        for _ in 0..ID_LEN {
            buf.push(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char);
        }
        ObjectId::Text(Rc::from(buf.as_str()))
    }
}
