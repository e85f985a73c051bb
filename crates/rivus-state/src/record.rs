//! Structured record composition
//!
//! An [`ObjectType`] is an explicit schema: an ordered list of field-name /
//! template pairs validated against the reserved operation names at
//! definition time. Instantiating it yields a [`Record`]: a stable id plus
//! one owned observable instance per field. The record subscribes to each
//! field and re-emits its own `change` (and, when the type is serializable,
//! `serializable-change`) with itself as payload.

use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value as Json;

use rivus_core::{
    EventHub, EventKind, Listener, Meta, ObjectId, RandomIds, RivusError, RivusResult,
    SharedIdSource,
};

use crate::template::json_kind;
use crate::{Collection, Datum, Instance, Mutability, Payload, Template, Value};

/// Field names that collide with the record operation surface
pub const RESERVED_FIELD_NAMES: &[&str] = &[
    "id",
    "get",
    "set",
    "update",
    "emit",
    "on",
    "off",
    "serialize",
];

struct ObjectTypeInner {
    fields: IndexMap<String, Template>,
    serializable: bool,
    ids: SharedIdSource,
}

/// A record schema. Type identity is handle identity: collections and unions
/// accept exactly the instances created through the same `ObjectType`, so
/// apply the `with_*` builders before anything references the type.
#[derive(Clone)]
pub struct ObjectType(Rc<ObjectTypeInner>);

/// Define a record schema from ordered field-name / template pairs. Fails
/// with a reserved-name error before any instance exists.
pub fn object<K, I>(fields: I) -> RivusResult<ObjectType>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Template)>,
{
    let mut map = IndexMap::new();
    for (name, template) in fields {
        let name = name.into();
        if RESERVED_FIELD_NAMES.contains(&name.as_str()) {
            return Err(RivusError::ReservedField(name));
        }
        map.insert(name, template);
    }
    Ok(ObjectType(Rc::new(ObjectTypeInner {
        fields: map,
        serializable: true,
        ids: Rc::new(RandomIds),
    })))
}

impl ObjectType {
    pub fn with_serializable(self, serializable: bool) -> Self {
        ObjectType(Rc::new(ObjectTypeInner {
            fields: self.0.fields.clone(),
            serializable,
            ids: Rc::clone(&self.0.ids),
        }))
    }

    /// Inject the id-generation capability (tests supply deterministic ids)
    pub fn with_id_source(self, ids: SharedIdSource) -> Self {
        ObjectType(Rc::new(ObjectTypeInner {
            fields: self.0.fields.clone(),
            serializable: self.0.serializable,
            ids,
        }))
    }

    pub fn is_serializable(&self) -> bool {
        self.0.serializable
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.fields.keys().map(String::as_str)
    }

    pub(crate) fn field_template(&self, name: &str) -> Option<&Template> {
        self.0.fields.get(name)
    }

    pub fn ptr_eq(&self, other: &ObjectType) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Instantiate from raw input. The id propagates from the input when
    /// present, else a fresh one is generated; each field constructs from
    /// its slice of the input (or its default).
    pub fn create(&self, raw: Option<&Json>) -> RivusResult<Record> {
        let map = raw.and_then(Json::as_object);
        let id = map
            .and_then(|m| m.get("id"))
            .and_then(ObjectId::from_json)
            .unwrap_or_else(|| self.0.ids.next_id());

        let mut fields = IndexMap::new();
        for (name, template) in &self.0.fields {
            let instance = template.create(map.and_then(|m| m.get(name.as_str())))?;
            fields.insert(name.clone(), instance);
        }

        let record = Record(Rc::new(RecordInner {
            hub: EventHub::new(),
            ty: self.clone(),
            id,
            fields,
        }));
        record.subscribe_fields();
        tracing::trace!(id = %record.id(), "record created");
        Ok(record)
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.fields.keys()).finish()
    }
}

struct RecordInner {
    hub: EventHub<Payload>,
    ty: ObjectType,
    id: ObjectId,
    fields: IndexMap<String, Instance>,
}

/// Shared handle to a record instance
#[derive(Clone)]
pub struct Record(Rc<RecordInner>);

impl Record {
    pub fn id(&self) -> &ObjectId {
        &self.0.id
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.0.ty
    }

    pub fn is_of_type(&self, ty: &ObjectType) -> bool {
        self.0.ty.ptr_eq(ty)
    }

    pub fn is_serializable(&self) -> bool {
        self.0.ty.is_serializable()
    }

    /// The field instance declared under `name`
    pub fn field(&self, name: &str) -> Option<&Instance> {
        self.0.fields.get(name)
    }

    /// The field under `name` as a single-slot value
    pub fn value(&self, name: &str) -> Option<Value> {
        self.field(name).and_then(Instance::as_value).cloned()
    }

    /// The field under `name` as a collection
    pub fn collection(&self, name: &str) -> Option<Collection> {
        self.field(name).and_then(Instance::as_collection).cloned()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.0.fields.iter().map(|(name, i)| (name.as_str(), i))
    }

    /// Register a listener, returning self for chaining
    pub fn on(&self, kind: EventKind, listener: Listener<Payload>) -> &Self {
        self.0.hub.on(kind, listener);
        self
    }

    pub fn off(&self, kind: EventKind, listener: &Listener<Payload>) -> &Self {
        self.0.hub.off(kind, listener);
        self
    }

    /// Forward each present key to its field's `set`. Unknown keys and
    /// constant or composite fields are ignored silently.
    pub fn update(&self, partial: &Json, meta: Option<&Meta>) -> RivusResult<()> {
        let map = partial.as_object().ok_or_else(|| {
            RivusError::TypeConstraint(format!(
                "expected an object of field values, got {}",
                json_kind(partial)
            ))
        })?;
        for (key, raw) in map {
            let Some(template) = self.0.ty.field_template(key) else {
                continue;
            };
            match template.resolve() {
                Template::Value(template) if template.mutability() == Mutability::Mutable => {
                    let datum = template.initial_datum(Some(raw))?;
                    if let Some(value) = self.value(key) {
                        value.set(datum, meta)?;
                    }
                }
                Template::Collection(template)
                    if template.mutability() == Mutability::Mutable =>
                {
                    let members = match raw {
                        Json::Array(items) => items
                            .iter()
                            .map(|item| template.member_type().create(Some(item)))
                            .collect::<RivusResult<Vec<_>>>()?,
                        other => {
                            return Err(RivusError::TypeConstraint(format!(
                                "expected an array for field `{key}`, got {}",
                                json_kind(other)
                            )))
                        }
                    };
                    if let Some(collection) = self.collection(key) {
                        collection.set(members, meta)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Plain-data representation: `{id, ...}` with only the individually
    /// serializable fields included
    pub fn serialize(&self) -> RivusResult<Json> {
        if !self.0.ty.is_serializable() {
            return Err(RivusError::NotSerializable);
        }
        let mut map = serde_json::Map::new();
        map.insert("id".into(), self.0.id.to_json());
        for (name, instance) in &self.0.fields {
            if instance.is_serializable() {
                map.insert(name.clone(), instance.serialize()?);
            }
        }
        Ok(Json::Object(map))
    }

    /// Reference identity of the underlying instance
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Aggregate child emissions into this record's own events. The field
    /// listeners hold the record weakly; the fields are owned by the record,
    /// so the subscription graph stays a tree.
    fn subscribe_fields(&self) {
        let serializable = self.0.ty.is_serializable();
        for instance in self.0.fields.values() {
            instance.on(EventKind::Change, self.aggregate_listener(EventKind::Change));
            if serializable {
                instance.on(
                    EventKind::SerializableChange,
                    self.aggregate_listener(EventKind::SerializableChange),
                );
            }
        }
    }

    fn aggregate_listener(&self, kind: EventKind) -> Listener<Payload> {
        let weak: Weak<RecordInner> = Rc::downgrade(&self.0);
        Rc::new(move |_payload: &Payload, meta: Option<&Meta>| {
            if let Some(inner) = weak.upgrade() {
                let payload = Payload::Datum(Datum::Record(Record(Rc::clone(&inner))));
                inner.hub.emit(kind, &payload, meta);
            }
        })
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({:?})", self.0.id)
    }
}
