//! Id-keyed observable collections
//!
//! A collection maps member ids to record instances in insertion order.
//! Member ids are unique within one collection: `add` of an existing id and
//! `remove` of an absent id are silent no-ops. The mutable variant
//! subscribes to each member and re-emits member changes as `item-change`
//! (plus the aggregate `change`); the constant variant freezes membership at
//! construction and never aggregates.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value as Json;

use rivus_core::{EventHub, EventKind, Listener, Meta, ObjectId, RivusError, RivusResult};

use crate::filtered::filter_collection;
use crate::mapped::map_collection;
use crate::{Datum, ObjectType, Payload, Record};

/// Capability surface of an id-keyed collection
pub trait CollectionLike {
    fn hub(&self) -> &EventHub<Payload>;

    /// Current members in insertion order
    fn members(&self) -> Vec<Record>;

    /// Member with the given id, if present
    fn member(&self, id: &ObjectId) -> Option<Record>;

    fn len(&self) -> usize;

    /// Replace the entire membership
    fn set(&self, members: Vec<Record>, meta: Option<&Meta>) -> RivusResult<()>;

    /// Insert one member; `None` constructs a default-initialized one
    fn add(&self, member: Option<Record>, meta: Option<&Meta>) -> RivusResult<()>;

    /// Remove the member with this instance's id
    fn remove(&self, member: &Record, meta: Option<&Meta>) -> RivusResult<()>;

    fn serialize(&self) -> RivusResult<Json>;

    fn is_serializable(&self) -> bool;
}

/// Shared handle to an id-keyed collection
#[derive(Clone)]
pub struct Collection(Rc<dyn CollectionLike>);

impl Collection {
    pub(crate) fn from_like(like: Rc<dyn CollectionLike>) -> Collection {
        Collection(like)
    }

    /// All current members in insertion order
    pub fn get(&self) -> Vec<Record> {
        self.0.members()
    }

    /// Member with the given id, if present
    pub fn get_by_id(&self, id: &ObjectId) -> Option<Record> {
        self.0.member(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.0.member(id).is_some()
    }

    pub fn set(&self, members: Vec<Record>, meta: Option<&Meta>) -> RivusResult<()> {
        self.0.set(members, meta)
    }

    pub fn add(&self, member: Record, meta: Option<&Meta>) -> RivusResult<()> {
        self.0.add(Some(member), meta)
    }

    /// Insert a fresh default-initialized member
    pub fn add_default(&self, meta: Option<&Meta>) -> RivusResult<()> {
        self.0.add(None, meta)
    }

    pub fn remove(&self, member: &Record, meta: Option<&Meta>) -> RivusResult<()> {
        self.0.remove(member, meta)
    }

    pub fn serialize(&self) -> RivusResult<Json> {
        self.0.serialize()
    }

    pub fn is_serializable(&self) -> bool {
        self.0.is_serializable()
    }

    /// Register a listener, returning self for chaining
    pub fn on(&self, kind: EventKind, listener: Listener<Payload>) -> &Self {
        self.0.hub().on(kind, listener);
        self
    }

    pub fn off(&self, kind: EventKind, listener: &Listener<Payload>) -> &Self {
        self.0.hub().off(kind, listener);
        self
    }

    /// Project the full member sequence into a derived Value - collections
    /// become scalars under mapping
    pub fn map(&self, f: impl Fn(&[Record]) -> Datum + 'static) -> crate::Value {
        map_collection(self, f)
    }

    /// Live read-only view of the members currently satisfying `predicate`
    pub fn filter(&self, predicate: impl Fn(&Record) -> bool + 'static) -> Collection {
        filter_collection(self, predicate)
    }

    /// Reference identity of the underlying instance
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collection(len={})", self.0.len())
    }
}

/// Frozen membership: an ordered backing sequence plus an id map for lookup
struct ConstantCollection {
    hub: EventHub<Payload>,
    values: Vec<Record>,
    by_id: HashMap<ObjectId, Record>,
    serializable: bool,
}

impl CollectionLike for ConstantCollection {
    fn hub(&self) -> &EventHub<Payload> {
        &self.hub
    }

    fn members(&self) -> Vec<Record> {
        self.values.clone()
    }

    fn member(&self, id: &ObjectId) -> Option<Record> {
        self.by_id.get(id).cloned()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn set(&self, _members: Vec<Record>, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a constant collection cannot be modified",
        ))
    }

    fn add(&self, _member: Option<Record>, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a constant collection cannot be modified",
        ))
    }

    fn remove(&self, _member: &Record, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a constant collection cannot be modified",
        ))
    }

    fn serialize(&self) -> RivusResult<Json> {
        if !self.serializable {
            return Err(RivusError::NotSerializable);
        }
        let members = self
            .values
            .iter()
            .map(Record::serialize)
            .collect::<RivusResult<Vec<_>>>()?;
        Ok(Json::Array(members))
    }

    fn is_serializable(&self) -> bool {
        self.serializable
    }
}

pub(crate) fn new_constant_collection(members: Vec<Record>, serializable: bool) -> Collection {
    let by_id = members
        .iter()
        .map(|m| (m.id().clone(), m.clone()))
        .collect();
    Collection(Rc::new(ConstantCollection {
        hub: EventHub::new(),
        values: members,
        by_id,
        serializable,
    }))
}

#[derive(Default)]
struct Membership {
    members: IndexMap<ObjectId, Record>,
    change_listeners: HashMap<ObjectId, Listener<Payload>>,
    serializable_listeners: HashMap<ObjectId, Listener<Payload>>,
}

/// Writable membership with per-member change aggregation
struct MutableCollection {
    weak_self: Weak<MutableCollection>,
    hub: EventHub<Payload>,
    member_type: ObjectType,
    state: RefCell<Membership>,
    serializable: bool,
}

impl MutableCollection {
    fn snapshot(&self) -> Vec<Record> {
        self.state.borrow().members.values().cloned().collect()
    }

    fn check_type(&self, member: &Record) -> RivusResult<()> {
        if member.is_of_type(&self.member_type) {
            Ok(())
        } else {
            Err(RivusError::TypeConstraint(
                "member does not have the collection's member type".into(),
            ))
        }
    }

    /// Subscribe to a member and register the bookkeeping entries. The
    /// listeners hold this collection weakly; the membership map owns them.
    fn attach(&self, membership: &mut Membership, member: &Record) {
        let change = {
            let weak = self.weak_self.clone();
            rivus_core::listener(move |payload: &Payload, meta: Option<&Meta>| {
                if let Some(coll) = weak.upgrade() {
                    coll.hub.emit(EventKind::ItemChange, payload, meta);
                    let members = Payload::Members(coll.snapshot());
                    coll.hub.emit(EventKind::Change, &members, meta);
                }
            })
        };
        member.on(EventKind::Change, Rc::clone(&change));
        membership
            .change_listeners
            .insert(member.id().clone(), change);

        if self.serializable {
            let serializable = {
                let weak = self.weak_self.clone();
                rivus_core::listener(move |payload: &Payload, meta: Option<&Meta>| {
                    if let Some(coll) = weak.upgrade() {
                        coll.hub
                            .emit(EventKind::ItemSerializableChange, payload, meta);
                        let members = Payload::Members(coll.snapshot());
                        coll.hub.emit(EventKind::SerializableChange, &members, meta);
                    }
                })
            };
            member.on(EventKind::SerializableChange, Rc::clone(&serializable));
            membership
                .serializable_listeners
                .insert(member.id().clone(), serializable);
        }
    }

    fn detach(membership: &mut Membership, member: &Record) {
        if let Some(listener) = membership.change_listeners.remove(member.id()) {
            member.off(EventKind::Change, &listener);
        }
        if let Some(listener) = membership.serializable_listeners.remove(member.id()) {
            member.off(EventKind::SerializableChange, &listener);
        }
    }

    /// Insert with attach, replacing (and detaching) any member already
    /// holding the id
    fn insert(&self, membership: &mut Membership, member: Record) {
        if let Some(existing) = membership.members.get(member.id()).cloned() {
            Self::detach(membership, &existing);
        }
        self.attach(membership, &member);
        membership.members.insert(member.id().clone(), member);
    }

    fn emit_membership(&self, kinds: &[EventKind], meta: Option<&Meta>) {
        let members = Payload::Members(self.snapshot());
        for kind in kinds {
            self.hub.emit(*kind, &members, meta);
        }
        if self.serializable {
            self.hub.emit(EventKind::SerializableChange, &members, meta);
        }
    }
}

impl CollectionLike for MutableCollection {
    fn hub(&self) -> &EventHub<Payload> {
        &self.hub
    }

    fn members(&self) -> Vec<Record> {
        self.snapshot()
    }

    fn member(&self, id: &ObjectId) -> Option<Record> {
        self.state.borrow().members.get(id).cloned()
    }

    fn len(&self) -> usize {
        self.state.borrow().members.len()
    }

    fn set(&self, members: Vec<Record>, meta: Option<&Meta>) -> RivusResult<()> {
        for member in &members {
            self.check_type(member)?;
        }
        {
            let mut state = self.state.borrow_mut();
            let old: Vec<Record> = state.members.values().cloned().collect();
            for member in &old {
                Self::detach(&mut state, member);
            }
            state.members.clear();
            for member in members {
                self.insert(&mut state, member);
            }
        }
        tracing::debug!(len = self.len(), "membership replaced");
        self.emit_membership(&[EventKind::Set, EventKind::Change], meta);
        Ok(())
    }

    fn add(&self, member: Option<Record>, meta: Option<&Meta>) -> RivusResult<()> {
        let member = match member {
            Some(member) => member,
            None => self.member_type.create(None)?,
        };
        self.check_type(&member)?;
        {
            let mut state = self.state.borrow_mut();
            if state.members.contains_key(member.id()) {
                // Idempotent by id: membership and event count unchanged
                return Ok(());
            }
            self.attach(&mut state, &member);
            state.members.insert(member.id().clone(), member.clone());
        }
        tracing::debug!(id = %member.id(), "member added");
        self.hub
            .emit(EventKind::ItemAdd, &Payload::member(member), meta);
        self.emit_membership(&[EventKind::Change], meta);
        Ok(())
    }

    fn remove(&self, member: &Record, meta: Option<&Meta>) -> RivusResult<()> {
        self.check_type(member)?;
        let removed = {
            let mut state = self.state.borrow_mut();
            match state.members.shift_remove(member.id()) {
                // Absent id: silent no-op
                None => return Ok(()),
                Some(existing) => {
                    Self::detach(&mut state, &existing);
                    existing
                }
            }
        };
        tracing::debug!(id = %removed.id(), "member removed");
        self.hub
            .emit(EventKind::ItemRemove, &Payload::member(removed), meta);
        self.emit_membership(&[EventKind::Change], meta);
        Ok(())
    }

    fn serialize(&self) -> RivusResult<Json> {
        if !self.serializable {
            return Err(RivusError::NotSerializable);
        }
        let members = self
            .snapshot()
            .iter()
            .map(Record::serialize)
            .collect::<RivusResult<Vec<_>>>()?;
        Ok(Json::Array(members))
    }

    fn is_serializable(&self) -> bool {
        self.serializable
    }
}

pub(crate) fn new_mutable_collection(
    member_type: ObjectType,
    members: Vec<Record>,
    serializable: bool,
) -> Collection {
    let coll = Rc::new_cyclic(|weak| MutableCollection {
        weak_self: weak.clone(),
        hub: EventHub::new(),
        member_type,
        state: RefCell::new(Membership::default()),
        serializable,
    });
    {
        let mut state = coll.state.borrow_mut();
        for member in members {
            coll.insert(&mut state, member);
        }
    }
    Collection(coll)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use rivus_core::{listener, PrimitiveKind};
    use serde_json::json;

    use crate::{constant_collection, mutable, mutable_collection, object};

    use super::*;

    fn point_type() -> ObjectType {
        object([
            ("x", mutable(PrimitiveKind::Number).into()),
            ("y", mutable(PrimitiveKind::Number).into()),
        ])
        .unwrap()
    }

    fn record_kinds(log: &Rc<RefCell<Vec<EventKind>>>, coll: &Collection, kinds: &[EventKind]) {
        for kind in kinds {
            let kind = *kind;
            let log = Rc::clone(log);
            coll.on(kind, listener(move |_: &Payload, _| log.borrow_mut().push(kind)));
        }
    }

    #[test]
    fn test_initialises_empty() {
        let coll = mutable_collection(point_type()).create(None).unwrap();
        assert!(coll.get().is_empty());
        assert!(coll.is_empty());
    }

    #[test]
    fn test_initialises_from_array_in_order() {
        let coll = mutable_collection(point_type())
            .create(Some(&json!([
                {"id": 0, "x": 5, "y": 4},
                {"id": 1, "x": 3, "y": 10},
            ])))
            .unwrap();
        let members = coll.get();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id(), &ObjectId::from(0));
        assert_eq!(members[1].id(), &ObjectId::from(1));
    }

    #[test]
    fn test_initialises_from_default() {
        let template = mutable_collection(point_type())
            .with_default_fn(|| json!([{"id": 0, "x": 5, "y": 4}]));
        let coll = template.create(None).unwrap();
        assert_eq!(coll.len(), 1);
        assert_eq!(
            coll.get_by_id(&ObjectId::from(0)).unwrap().id(),
            &ObjectId::from(0)
        );
    }

    #[test]
    fn test_rejects_non_array_input() {
        let result = mutable_collection(point_type()).create(Some(&json!("not an array")));
        assert!(matches!(result, Err(RivusError::TypeConstraint(_))));
    }

    #[test]
    fn test_set_replaces_membership_and_emits() {
        let ty = point_type();
        let coll = mutable_collection(ty.clone()).create(None).unwrap();
        let p = ty.create(Some(&json!({"x": 5, "y": 10}))).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        record_kinds(
            &log,
            &coll,
            &[EventKind::Set, EventKind::Change, EventKind::SerializableChange],
        );

        coll.set(vec![p.clone()], None).unwrap();
        assert_eq!(coll.get().len(), 1);
        assert!(coll.get()[0].ptr_eq(&p));
        assert_eq!(
            log.borrow().as_slice(),
            &[EventKind::Set, EventKind::Change, EventKind::SerializableChange]
        );
    }

    #[test]
    fn test_set_detaches_old_members() {
        let ty = point_type();
        let coll = mutable_collection(ty.clone())
            .create(Some(&json!([{"id": 0, "x": 1, "y": 1}])))
            .unwrap();
        let old = coll.get_by_id(&ObjectId::from(0)).unwrap();
        let replacement = ty.create(Some(&json!({"id": 1, "x": 2, "y": 2}))).unwrap();
        coll.set(vec![replacement], None).unwrap();

        let changes = Rc::new(RefCell::new(0u32));
        {
            let changes = Rc::clone(&changes);
            coll.on(
                EventKind::Change,
                listener(move |_: &Payload, _| *changes.borrow_mut() += 1),
            );
        }
        // The detached member no longer triggers collection change events
        old.value("x").unwrap().set(99.0, None).unwrap();
        assert_eq!(*changes.borrow(), 0);
    }

    #[test]
    fn test_set_rejects_wrong_member_type() {
        let other = object([("z", mutable(PrimitiveKind::Number).into())]).unwrap();
        let coll = mutable_collection(point_type()).create(None).unwrap();
        let alien = other.create(None).unwrap();
        assert!(matches!(
            coll.set(vec![alien], None),
            Err(RivusError::TypeConstraint(_))
        ));
    }

    #[test]
    fn test_add_emits_item_add_then_change() {
        let ty = point_type();
        let coll = mutable_collection(ty.clone()).create(None).unwrap();
        let p = ty.create(Some(&json!({"x": 5, "y": 10}))).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        record_kinds(&log, &coll, &[EventKind::ItemAdd, EventKind::Change]);

        coll.add(p.clone(), None).unwrap();
        assert_eq!(coll.get().len(), 1);
        assert_eq!(
            log.borrow().as_slice(),
            &[EventKind::ItemAdd, EventKind::Change]
        );
    }

    #[test]
    fn test_add_is_idempotent_by_id() {
        let ty = point_type();
        let coll = mutable_collection(ty.clone()).create(None).unwrap();
        let p = ty.create(Some(&json!({"id": "P", "x": 1, "y": 1}))).unwrap();

        let events = Rc::new(RefCell::new(0u32));
        for kind in [EventKind::ItemAdd, EventKind::Change, EventKind::SerializableChange] {
            let events = Rc::clone(&events);
            coll.on(kind, listener(move |_: &Payload, _| *events.borrow_mut() += 1));
        }

        coll.add(p.clone(), None).unwrap();
        let after_first = *events.borrow();
        coll.add(p, None).unwrap();
        assert_eq!(coll.len(), 1);
        // Zero additional events
        assert_eq!(*events.borrow(), after_first);
    }

    #[test]
    fn test_add_default_constructs_member() {
        let coll = mutable_collection(point_type()).create(None).unwrap();
        coll.add_default(None).unwrap();
        assert_eq!(coll.len(), 1);
        let member = &coll.get()[0];
        assert_eq!(member.value("x").unwrap().get(), Datum::from(0.0));
    }

    #[test]
    fn test_remove_emits_and_detaches() {
        let ty = point_type();
        let coll = mutable_collection(ty.clone())
            .create(Some(&json!([{"id": 0, "x": 5, "y": 10}])))
            .unwrap();
        let p = coll.get_by_id(&ObjectId::from(0)).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        record_kinds(&log, &coll, &[EventKind::ItemRemove, EventKind::Change]);

        coll.remove(&p, None).unwrap();
        assert!(coll.is_empty());
        assert_eq!(
            log.borrow().as_slice(),
            &[EventKind::ItemRemove, EventKind::Change]
        );

        log.borrow_mut().clear();
        // Former member changes no longer aggregate
        p.value("x").unwrap().set(42.0, None).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let ty = point_type();
        let coll = mutable_collection(ty.clone()).create(None).unwrap();
        let p = ty.create(None).unwrap();

        let events = Rc::new(RefCell::new(0u32));
        {
            let events = Rc::clone(&events);
            coll.on(
                EventKind::Change,
                listener(move |_: &Payload, _| *events.borrow_mut() += 1),
            );
        }
        coll.remove(&p, None).unwrap();
        assert_eq!(*events.borrow(), 0);
    }

    #[test]
    fn test_member_change_aggregates() {
        let coll = mutable_collection(point_type())
            .create(Some(&json!([{"id": 0, "x": 1, "y": 1}])))
            .unwrap();
        let member = coll.get_by_id(&ObjectId::from(0)).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        record_kinds(
            &log,
            &coll,
            &[
                EventKind::ItemChange,
                EventKind::Change,
                EventKind::ItemSerializableChange,
                EventKind::SerializableChange,
            ],
        );

        member.value("x").unwrap().set(7.0, None).unwrap();
        assert_eq!(
            log.borrow().as_slice(),
            &[
                EventKind::ItemChange,
                EventKind::Change,
                EventKind::ItemSerializableChange,
                EventKind::SerializableChange,
            ]
        );
    }

    #[test]
    fn test_serializes_members_in_order() {
        let coll = mutable_collection(point_type())
            .create(Some(&json!([
                {"id": 0, "x": 5, "y": 4},
                {"id": 1, "x": 3, "y": 10},
            ])))
            .unwrap();
        assert_eq!(
            coll.serialize().unwrap(),
            json!([
                {"id": 0, "x": 5, "y": 4},
                {"id": 1, "x": 3, "y": 10},
            ])
        );
    }

    #[test]
    fn test_unserializable_collection_refuses() {
        let coll = mutable_collection(point_type())
            .with_serializable(false)
            .create(Some(&json!([{"id": 0, "x": 5, "y": 4}])))
            .unwrap();
        assert!(matches!(
            coll.serialize(),
            Err(RivusError::NotSerializable)
        ));
    }

    #[test]
    fn test_map_degrades_to_value() {
        let coll = mutable_collection(point_type())
            .create(Some(&json!([
                {"id": 0, "x": 5, "y": 4},
                {"id": 1, "x": 3, "y": 10},
            ])))
            .unwrap();
        let count = coll.map(|members| Datum::from(members.len() as f64));
        assert_eq!(count.get(), Datum::from(2.0));

        coll.add_default(None).unwrap();
        assert_eq!(count.get(), Datum::from(3.0));
    }

    #[test]
    fn test_constant_collection_is_frozen() {
        let ty = point_type();
        let coll = constant_collection(ty.clone())
            .create(Some(&json!([{"id": 0, "x": 5, "y": 4}])))
            .unwrap();
        let p = ty.create(None).unwrap();

        assert!(matches!(
            coll.set(vec![p.clone()], None),
            Err(RivusError::InvalidOperation(_))
        ));
        assert!(matches!(
            coll.add(p.clone(), None),
            Err(RivusError::InvalidOperation(_))
        ));
        assert!(matches!(
            coll.remove(&p, None),
            Err(RivusError::InvalidOperation(_))
        ));
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_constant_collection_lookup_and_serialize() {
        let coll = constant_collection(point_type())
            .create(Some(&json!([
                {"id": 0, "x": 5, "y": 4},
                {"id": 1, "x": 3, "y": 10},
            ])))
            .unwrap();
        assert!(coll.contains(&ObjectId::from(1)));
        assert_eq!(
            coll.serialize().unwrap(),
            json!([
                {"id": 0, "x": 5, "y": 4},
                {"id": 1, "x": 3, "y": 10},
            ])
        );
    }
}
