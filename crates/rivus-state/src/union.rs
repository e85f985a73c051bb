//! Tagged unions over record types
//!
//! A [`OneOfType`] fixes a closed set of variant names, each bound to an
//! Object type. An instance pairs a tag with a payload record of the
//! matching type; the tag always reflects the payload's runtime type.
//! There is no transition operation - replacing the payload means
//! constructing a new instance.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as Json;

use rivus_core::{EventHub, EventKind, Listener, RivusError, RivusResult};

use crate::{ObjectType, Payload, Record};

struct OneOfTypeInner {
    variants: IndexMap<String, ObjectType>,
}

/// A union schema over a fixed set of record types
#[derive(Clone)]
pub struct OneOfType(Rc<OneOfTypeInner>);

/// Define a union from ordered variant-name / Object-type pairs
pub fn oneof<K, I>(variants: I) -> OneOfType
where
    K: Into<String>,
    I: IntoIterator<Item = (K, ObjectType)>,
{
    OneOfType(Rc::new(OneOfTypeInner {
        variants: variants
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .collect(),
    }))
}

impl OneOfType {
    pub fn variant(&self, name: &str) -> Option<&ObjectType> {
        self.0.variants.get(name)
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.0.variants.keys().map(String::as_str)
    }

    pub fn ptr_eq(&self, other: &OneOfType) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Construct from a `{type, value}` descriptor. The tag is validated
    /// against the declared set and the payload constructed accordingly.
    pub fn create(&self, raw: Option<&Json>) -> RivusResult<OneOf> {
        let descriptor = raw
            .and_then(Json::as_object)
            .ok_or_else(|| RivusError::UnknownVariant("<missing descriptor>".into()))?;
        let tag = descriptor
            .get("type")
            .and_then(Json::as_str)
            .ok_or_else(|| RivusError::UnknownVariant("<missing tag>".into()))?;
        let variant = self
            .variant(tag)
            .ok_or_else(|| RivusError::UnknownVariant(tag.into()))?;
        let value = variant.create(descriptor.get("value"))?;
        Ok(OneOf(Rc::new(OneOfInner {
            hub: EventHub::new(),
            ty: self.clone(),
            tag: tag.to_owned(),
            value,
        })))
    }

    /// Wrap an existing record, inferring the tag from its runtime type
    pub fn from_instance(&self, value: Record) -> RivusResult<OneOf> {
        let tag = self
            .0
            .variants
            .iter()
            .find(|(_, ty)| value.is_of_type(ty))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| {
                RivusError::UnknownVariant("payload matches no declared variant".into())
            })?;
        Ok(OneOf(Rc::new(OneOfInner {
            hub: EventHub::new(),
            ty: self.clone(),
            tag,
            value,
        })))
    }
}

impl fmt::Debug for OneOfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.variants.keys()).finish()
    }
}

struct OneOfInner {
    hub: EventHub<Payload>,
    ty: OneOfType,
    tag: String,
    value: Record,
}

/// Shared handle to a union instance: an immutable tag plus payload
#[derive(Clone)]
pub struct OneOf(Rc<OneOfInner>);

impl OneOf {
    /// The variant tag; always matches the payload's runtime type
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    /// The payload record
    pub fn value(&self) -> &Record {
        &self.0.value
    }

    pub fn oneof_type(&self) -> &OneOfType {
        &self.0.ty
    }

    pub fn on(&self, kind: EventKind, listener: Listener<Payload>) -> &Self {
        self.0.hub.on(kind, listener);
        self
    }

    pub fn off(&self, kind: EventKind, listener: &Listener<Payload>) -> &Self {
        self.0.hub.off(kind, listener);
        self
    }

    /// Plain-data representation: `{type, value}`
    pub fn serialize(&self) -> RivusResult<Json> {
        let mut map = serde_json::Map::new();
        map.insert("type".into(), Json::String(self.0.tag.clone()));
        map.insert("value".into(), self.0.value.serialize()?);
        Ok(Json::Object(map))
    }

    /// Reference identity of the underlying instance
    pub fn ptr_eq(&self, other: &OneOf) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OneOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OneOf({}, {:?})", self.0.tag, self.0.value)
    }
}
