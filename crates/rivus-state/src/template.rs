//! Type tokens, factories, and field templates
//!
//! A [`ValueType`] is the explicit type token a slot is declared over: a
//! primitive kind or a composed type. The `constant`/`mutable` and
//! `constant_collection`/`mutable_collection` factories produce builder-style
//! templates; a [`Template`] is what a record schema declares per field.
//!
//! Defaults are a literal or a zero-argument producer. An explicit raw input
//! wins over the default; with neither, primitives take their zero value and
//! composed types default-construct.

use std::rc::Rc;

use serde_json::Value as Json;

use rivus_core::{PrimitiveKind, RivusError, RivusResult};

use crate::collection::{new_constant_collection, new_mutable_collection};
use crate::value::{new_constant, new_mutable};
use crate::{Collection, Datum, Instance, ObjectType, OneOfType, Value};

/// Explicit type token: a primitive kind or a composed factory
#[derive(Clone)]
pub enum ValueType {
    Primitive(PrimitiveKind),
    Object(ObjectType),
    Union(OneOfType),
    Collection(CollectionTemplate),
}

impl ValueType {
    /// Construction rule: primitives pass through or zero; composed types
    /// construct from the raw data (or default-construct without it).
    pub(crate) fn construct(&self, raw: Option<&Json>) -> RivusResult<Datum> {
        match self {
            ValueType::Primitive(kind) => Ok(Datum::Scalar(kind.from_json(raw))),
            ValueType::Object(ty) => ty.create(raw).map(Datum::Record),
            ValueType::Union(ty) => ty.create(raw).map(Datum::Union),
            ValueType::Collection(template) => template.create(raw).map(Datum::Collection),
        }
    }
}

impl From<PrimitiveKind> for ValueType {
    fn from(kind: PrimitiveKind) -> Self {
        ValueType::Primitive(kind)
    }
}

impl From<ObjectType> for ValueType {
    fn from(ty: ObjectType) -> Self {
        ValueType::Object(ty)
    }
}

impl From<OneOfType> for ValueType {
    fn from(ty: OneOfType) -> Self {
        ValueType::Union(ty)
    }
}

impl From<CollectionTemplate> for ValueType {
    fn from(template: CollectionTemplate) -> Self {
        ValueType::Collection(template)
    }
}

/// Whether an instance accepts writes after construction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    Constant,
    Mutable,
}

/// Default value: a literal or a zero-argument producer
#[derive(Clone)]
pub enum DefaultSpec {
    Literal(Json),
    Producer(Rc<dyn Fn() -> Json>),
}

impl DefaultSpec {
    fn produce(&self) -> Json {
        match self {
            DefaultSpec::Literal(value) => value.clone(),
            DefaultSpec::Producer(f) => f(),
        }
    }
}

/// Raw input wins over the default; JSON null counts as absent.
fn effective_raw<'a>(raw: Option<&'a Json>, default: &Option<DefaultSpec>) -> Option<EffectiveRaw<'a>> {
    match raw {
        Some(value) if !value.is_null() => Some(EffectiveRaw::Supplied(value)),
        _ => default.as_ref().map(|d| EffectiveRaw::Defaulted(d.produce())),
    }
}

enum EffectiveRaw<'a> {
    Supplied(&'a Json),
    Defaulted(Json),
}

impl EffectiveRaw<'_> {
    fn as_json(&self) -> &Json {
        match self {
            EffectiveRaw::Supplied(value) => value,
            EffectiveRaw::Defaulted(value) => value,
        }
    }
}

/// Template for a single-slot observable, produced by [`constant`]/[`mutable`]
#[derive(Clone)]
pub struct ValueTemplate {
    mutability: Mutability,
    ty: ValueType,
    default: Option<DefaultSpec>,
    serializable: bool,
}

/// Factory for write-once values
pub fn constant(ty: impl Into<ValueType>) -> ValueTemplate {
    ValueTemplate {
        mutability: Mutability::Constant,
        ty: ty.into(),
        default: None,
        serializable: true,
    }
}

/// Factory for writable values
pub fn mutable(ty: impl Into<ValueType>) -> ValueTemplate {
    ValueTemplate {
        mutability: Mutability::Mutable,
        ty: ty.into(),
        default: None,
        serializable: true,
    }
}

impl ValueTemplate {
    pub fn with_default(mut self, value: impl Into<Json>) -> Self {
        self.default = Some(DefaultSpec::Literal(value.into()));
        self
    }

    pub fn with_default_fn(mut self, f: impl Fn() -> Json + 'static) -> Self {
        self.default = Some(DefaultSpec::Producer(Rc::new(f)));
        self
    }

    pub fn with_serializable(mut self, serializable: bool) -> Self {
        self.serializable = serializable;
        self
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn value_type(&self) -> &ValueType {
        &self.ty
    }

    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Instantiate from raw input (or the default)
    pub fn create(&self, raw: Option<&Json>) -> RivusResult<Value> {
        let datum = self.initial_datum(raw)?;
        Ok(match self.mutability {
            Mutability::Constant => new_constant(datum, self.serializable),
            Mutability::Mutable => new_mutable(datum, self.serializable),
        })
    }

    pub(crate) fn initial_datum(&self, raw: Option<&Json>) -> RivusResult<Datum> {
        let effective = effective_raw(raw, &self.default);
        self.ty.construct(effective.as_ref().map(EffectiveRaw::as_json))
    }
}

/// Template for an id-keyed collection, produced by
/// [`constant_collection`]/[`mutable_collection`]
#[derive(Clone)]
pub struct CollectionTemplate {
    mutability: Mutability,
    member: ObjectType,
    default: Option<DefaultSpec>,
    serializable: bool,
}

/// Factory for collections with frozen membership
pub fn constant_collection(member: ObjectType) -> CollectionTemplate {
    CollectionTemplate {
        mutability: Mutability::Constant,
        member,
        default: None,
        serializable: true,
    }
}

/// Factory for collections with writable membership
pub fn mutable_collection(member: ObjectType) -> CollectionTemplate {
    CollectionTemplate {
        mutability: Mutability::Mutable,
        member,
        default: None,
        serializable: true,
    }
}

impl CollectionTemplate {
    pub fn with_default(mut self, value: impl Into<Json>) -> Self {
        self.default = Some(DefaultSpec::Literal(value.into()));
        self
    }

    pub fn with_default_fn(mut self, f: impl Fn() -> Json + 'static) -> Self {
        self.default = Some(DefaultSpec::Producer(Rc::new(f)));
        self
    }

    pub fn with_serializable(mut self, serializable: bool) -> Self {
        self.serializable = serializable;
        self
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn member_type(&self) -> &ObjectType {
        &self.member
    }

    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Instantiate from a raw member array (or the default)
    pub fn create(&self, raw: Option<&Json>) -> RivusResult<Collection> {
        let effective = effective_raw(raw, &self.default);
        let members = match effective.as_ref().map(EffectiveRaw::as_json) {
            None => Vec::new(),
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| self.member.create(Some(item)))
                .collect::<RivusResult<Vec<_>>>()?,
            Some(other) => {
                return Err(RivusError::TypeConstraint(format!(
                    "expected an array of members, got {}",
                    json_kind(other)
                )))
            }
        };
        Ok(match self.mutability {
            Mutability::Constant => new_constant_collection(members, self.serializable),
            Mutability::Mutable => {
                new_mutable_collection(self.member.clone(), members, self.serializable)
            }
        })
    }
}

/// What a record schema declares per field
#[derive(Clone)]
pub enum Template {
    Value(ValueTemplate),
    Collection(CollectionTemplate),
    Object(ObjectType),
    Union(OneOfType),
    /// Zero-argument producer, used to break circular type references
    Deferred(Rc<dyn Fn() -> Template>),
}

impl Template {
    pub fn deferred(f: impl Fn() -> Template + 'static) -> Template {
        Template::Deferred(Rc::new(f))
    }

    /// Chase deferred producers down to a concrete template
    pub(crate) fn resolve(&self) -> Template {
        match self {
            Template::Deferred(f) => f().resolve(),
            other => other.clone(),
        }
    }

    pub(crate) fn create(&self, raw: Option<&Json>) -> RivusResult<Instance> {
        match self {
            Template::Value(template) => template.create(raw).map(Instance::Value),
            Template::Collection(template) => template.create(raw).map(Instance::Collection),
            Template::Object(ty) => ty.create(raw).map(Instance::Record),
            Template::Union(ty) => ty.create(raw).map(Instance::Union),
            Template::Deferred(f) => f().create(raw),
        }
    }
}

impl From<ValueTemplate> for Template {
    fn from(template: ValueTemplate) -> Self {
        Template::Value(template)
    }
}

impl From<CollectionTemplate> for Template {
    fn from(template: CollectionTemplate) -> Self {
        Template::Collection(template)
    }
}

impl From<ObjectType> for Template {
    fn from(ty: ObjectType) -> Self {
        Template::Object(ty)
    }
}

impl From<OneOfType> for Template {
    fn from(ty: OneOfType) -> Self {
        Template::Union(ty)
    }
}

pub(crate) fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
