//! Live filtered collection views
//!
//! A filtered view tracks the members of a source collection currently
//! satisfying a predicate. Membership is maintained incrementally: a member
//! enters the view when it starts satisfying the predicate (on insertion or
//! on its own change) and leaves when it stops satisfying it or leaves the
//! source. The view itself is read-only.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value as Json;

use rivus_core::{EventHub, EventKind, Meta, ObjectId, RivusError, RivusResult};

use crate::collection::CollectionLike;
use crate::{Collection, Payload, Record};

struct FilteredCollection {
    hub: EventHub<Payload>,
    source: Collection,
    predicate: Rc<dyn Fn(&Record) -> bool>,
    view: RefCell<IndexMap<ObjectId, Record>>,
}

impl FilteredCollection {
    fn snapshot(&self) -> Vec<Record> {
        self.view.borrow().values().cloned().collect()
    }

    /// A source member joined: admit it when it satisfies the predicate
    fn on_source_add(&self, member: &Record, meta: Option<&Meta>) {
        if !(self.predicate)(member) {
            return;
        }
        let fresh = self
            .view
            .borrow_mut()
            .insert(member.id().clone(), member.clone())
            .is_none();
        if fresh {
            self.emit_item(EventKind::ItemAdd, member.clone(), meta);
        }
    }

    /// A source member left: evict it if it was in the view
    fn on_source_remove(&self, member: &Record, meta: Option<&Meta>) {
        let evicted = self.view.borrow_mut().shift_remove(member.id());
        if let Some(evicted) = evicted {
            self.emit_item(EventKind::ItemRemove, evicted, meta);
        }
    }

    /// A source member changed: re-evaluate its membership
    fn on_source_change(&self, member: &Record, meta: Option<&Meta>) {
        let matches = (self.predicate)(member);
        let present = self.view.borrow().contains_key(member.id());
        match (matches, present) {
            (true, false) => {
                self.view
                    .borrow_mut()
                    .insert(member.id().clone(), member.clone());
                self.emit_item(EventKind::ItemAdd, member.clone(), meta);
            }
            (false, true) => {
                self.view.borrow_mut().shift_remove(member.id());
                self.emit_item(EventKind::ItemRemove, member.clone(), meta);
            }
            _ => {}
        }
    }

    /// The source was wholesale-replaced: diff the old view against the new
    fn on_source_set(&self, members: &[Record], meta: Option<&Meta>) {
        let next: IndexMap<ObjectId, Record> = members
            .iter()
            .filter(|m| (self.predicate)(m))
            .map(|m| (m.id().clone(), m.clone()))
            .collect();

        let (removed, added) = {
            let mut view = self.view.borrow_mut();
            let removed: Vec<Record> = view
                .values()
                .filter(|m| !next.contains_key(m.id()))
                .cloned()
                .collect();
            let added: Vec<Record> = next
                .values()
                .filter(|m| !view.contains_key(m.id()))
                .cloned()
                .collect();
            *view = next;
            (removed, added)
        };

        if removed.is_empty() && added.is_empty() {
            return;
        }
        for member in removed {
            self.hub
                .emit(EventKind::ItemRemove, &Payload::member(member), meta);
        }
        for member in added {
            self.hub
                .emit(EventKind::ItemAdd, &Payload::member(member), meta);
        }
        self.hub
            .emit(EventKind::Change, &Payload::Members(self.snapshot()), meta);
    }

    fn emit_item(&self, kind: EventKind, member: Record, meta: Option<&Meta>) {
        self.hub.emit(kind, &Payload::member(member), meta);
        self.hub
            .emit(EventKind::Change, &Payload::Members(self.snapshot()), meta);
    }
}

impl CollectionLike for FilteredCollection {
    fn hub(&self) -> &EventHub<Payload> {
        &self.hub
    }

    fn members(&self) -> Vec<Record> {
        self.snapshot()
    }

    fn member(&self, id: &ObjectId) -> Option<Record> {
        self.view.borrow().get(id).cloned()
    }

    fn len(&self) -> usize {
        self.view.borrow().len()
    }

    fn set(&self, _members: Vec<Record>, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a filtered view cannot be modified",
        ))
    }

    fn add(&self, _member: Option<Record>, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a filtered view cannot be modified",
        ))
    }

    fn remove(&self, _member: &Record, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a filtered view cannot be modified",
        ))
    }

    fn serialize(&self) -> RivusResult<Json> {
        if !self.source.is_serializable() {
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
        self.source.is_serializable()
    }
}

fn tracking_listener(
    view: &Rc<FilteredCollection>,
    apply: impl Fn(&FilteredCollection, &Payload, Option<&Meta>) + 'static,
) -> rivus_core::Listener<Payload> {
    let weak: Weak<FilteredCollection> = Rc::downgrade(view);
    Rc::new(move |payload: &Payload, meta: Option<&Meta>| {
        if let Some(view) = weak.upgrade() {
            apply(&view, payload, meta);
        }
    })
}

pub(crate) fn filter_collection(
    source: &Collection,
    predicate: impl Fn(&Record) -> bool + 'static,
) -> Collection {
    let predicate: Rc<dyn Fn(&Record) -> bool> = Rc::new(predicate);
    let view: IndexMap<ObjectId, Record> = source
        .get()
        .into_iter()
        .filter(|m| predicate(m))
        .map(|m| (m.id().clone(), m))
        .collect();
    let filtered = Rc::new(FilteredCollection {
        hub: EventHub::new(),
        source: source.clone(),
        predicate,
        view: RefCell::new(view),
    });

    source.on(
        EventKind::ItemAdd,
        tracking_listener(&filtered, |view, payload, meta| {
            if let Some(member) = payload.as_member() {
                view.on_source_add(member, meta);
            }
        }),
    );
    source.on(
        EventKind::ItemRemove,
        tracking_listener(&filtered, |view, payload, meta| {
            if let Some(member) = payload.as_member() {
                view.on_source_remove(member, meta);
            }
        }),
    );
    source.on(
        EventKind::ItemChange,
        tracking_listener(&filtered, |view, payload, meta| {
            if let Some(member) = payload.as_member() {
                view.on_source_change(member, meta);
            }
        }),
    );
    source.on(
        EventKind::Set,
        tracking_listener(&filtered, |view, payload, meta| {
            if let Some(members) = payload.as_members() {
                view.on_source_set(members, meta);
            }
        }),
    );

    Collection::from_like(filtered)
}
