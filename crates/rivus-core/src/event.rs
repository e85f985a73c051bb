//! Event kinds and the per-instance event hub
//!
//! Every observable instance owns a hub: a registry from event kind to the
//! set of listeners registered for it. Emission is a direct synchronous call
//! chain; the hub never holds its internal borrow across a listener
//! invocation, so listeners may register, deregister, or mutate the emitting
//! structure reentrantly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::Meta;

/// Event kind classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    SerializableChange,
    ItemChange,
    ItemSerializableChange,
    ItemAdd,
    ItemRemove,
    Set,
}

impl EventKind {
    /// Stable wire-facing name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Change => "change",
            EventKind::SerializableChange => "serializable-change",
            EventKind::ItemChange => "item-change",
            EventKind::ItemSerializableChange => "item-serializable-change",
            EventKind::ItemAdd => "item-add",
            EventKind::ItemRemove => "item-remove",
            EventKind::Set => "set",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "change" => Some(EventKind::Change),
            "serializable-change" => Some(EventKind::SerializableChange),
            "item-change" => Some(EventKind::ItemChange),
            "item-serializable-change" => Some(EventKind::ItemSerializableChange),
            "item-add" => Some(EventKind::ItemAdd),
            "item-remove" => Some(EventKind::ItemRemove),
            "set" => Some(EventKind::Set),
            _ => None,
        }
    }
}

/// Listener callback. The `Rc` pointer doubles as the listener's identity:
/// registering the same `Rc` twice coalesces, and `off` removes by pointer.
pub type Listener<P> = Rc<dyn Fn(&P, Option<&Meta>)>;

/// Wrap a closure as a [`Listener`]
pub fn listener<P>(f: impl Fn(&P, Option<&Meta>) + 'static) -> Listener<P> {
    Rc::new(f)
}

/// Per-instance publish/subscribe registry keyed by event kind
pub struct EventHub<P> {
    listeners: RefCell<HashMap<EventKind, Vec<Listener<P>>>>,
}

impl<P> EventHub<P> {
    pub fn new() -> Self {
        EventHub {
            listeners: RefCell::new(HashMap::new()),
        }
    }

    /// Register a listener for `kind`. Registering the same `Rc` twice for
    /// one kind is a no-op in effect (set semantics).
    pub fn on(&self, kind: EventKind, listener: Listener<P>) {
        let mut map = self.listeners.borrow_mut();
        let set = map.entry(kind).or_default();
        if !set.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            set.push(listener);
        }
    }

    /// Deregister a listener. Removing an unregistered listener is a no-op.
    pub fn off(&self, kind: EventKind, listener: &Listener<P>) {
        if let Some(set) = self.listeners.borrow_mut().get_mut(&kind) {
            set.retain(|l| !Rc::ptr_eq(l, listener));
        }
    }

    /// Synchronously invoke every listener currently registered for `kind`
    /// with `(payload, meta)`. Registration changes made by a listener apply
    /// to later emissions, not the in-flight one.
    pub fn emit(&self, kind: EventKind, payload: &P, meta: Option<&Meta>) {
        let snapshot: Vec<Listener<P>> = match self.listeners.borrow().get(&kind) {
            Some(set) => set.clone(),
            None => return,
        };
        for listener in snapshot {
            listener(payload, meta);
        }
    }

    /// Number of listeners currently registered for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .get(&kind)
            .map(|set| set.len())
            .unwrap_or(0)
    }
}

impl<P> Default for EventHub<P> {
    fn default() -> Self {
        EventHub::new()
    }
}
