//! Single-slot observable values
//!
//! [`Value`] is the shared handle over any single-slot variant: constants,
//! mutables, and derived projections. Change detection is by identity -
//! scalars compare by value, composites by reference - and a `set` that does
//! not change anything emits nothing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;

use rivus_core::{EventHub, EventKind, Listener, Meta, RivusError, RivusResult};

use crate::mapped::map_value;
use crate::{Datum, Payload};

/// Capability surface of a single-slot observable
pub trait ValueLike {
    fn hub(&self) -> &EventHub<Payload>;

    /// Current held datum, no side effect
    fn get(&self) -> Datum;

    /// Store a new datum, emitting `change` (and `serializable-change` when
    /// serializable) unless it equals the current one
    fn set(&self, datum: Datum, meta: Option<&Meta>) -> RivusResult<()>;

    /// Plain-data representation, gated by the serializable flag
    fn serialize(&self) -> RivusResult<Json>;

    fn is_serializable(&self) -> bool;
}

/// Shared handle to a single-slot observable
#[derive(Clone)]
pub struct Value(Rc<dyn ValueLike>);

impl Value {
    pub(crate) fn from_like(like: Rc<dyn ValueLike>) -> Value {
        Value(like)
    }

    pub fn get(&self) -> Datum {
        self.0.get()
    }

    pub fn set(&self, datum: impl Into<Datum>, meta: Option<&Meta>) -> RivusResult<()> {
        self.0.set(datum.into(), meta)
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

    /// Derived read-only projection of this value through a pure function.
    /// The projection re-emits `change`/`serializable-change` whenever this
    /// value does, and is serializable only when this value is.
    pub fn map(&self, f: impl Fn(&Datum) -> Datum + 'static) -> Value {
        map_value(self, f)
    }

    /// Reference identity of the underlying instance
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.get()).finish()
    }
}

/// Write-once slot: the held datum is fixed at construction
struct ConstantValue {
    hub: EventHub<Payload>,
    value: Datum,
    serializable: bool,
}

impl ValueLike for ConstantValue {
    fn hub(&self) -> &EventHub<Payload> {
        &self.hub
    }

    fn get(&self) -> Datum {
        self.value.clone()
    }

    fn set(&self, _datum: Datum, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation("a constant cannot be changed"))
    }

    fn serialize(&self) -> RivusResult<Json> {
        if self.serializable {
            self.value.serialize()
        } else {
            Err(RivusError::NotSerializable)
        }
    }

    fn is_serializable(&self) -> bool {
        self.serializable
    }
}

/// Writable slot with identity-based change detection
struct MutableValue {
    hub: EventHub<Payload>,
    value: RefCell<Datum>,
    serializable: bool,
}

impl ValueLike for MutableValue {
    fn hub(&self) -> &EventHub<Payload> {
        &self.hub
    }

    fn get(&self) -> Datum {
        self.value.borrow().clone()
    }

    fn set(&self, datum: Datum, meta: Option<&Meta>) -> RivusResult<()> {
        if *self.value.borrow() == datum {
            return Ok(());
        }
        *self.value.borrow_mut() = datum.clone();
        tracing::trace!(serializable = self.serializable, "value changed");
        let payload = Payload::Datum(datum);
        self.hub.emit(EventKind::Change, &payload, meta);
        if self.serializable {
            self.hub.emit(EventKind::SerializableChange, &payload, meta);
        }
        Ok(())
    }

    fn serialize(&self) -> RivusResult<Json> {
        if self.serializable {
            self.value.borrow().serialize()
        } else {
            Err(RivusError::NotSerializable)
        }
    }

    fn is_serializable(&self) -> bool {
        self.serializable
    }
}

pub(crate) fn new_constant(value: Datum, serializable: bool) -> Value {
    Value(Rc::new(ConstantValue {
        hub: EventHub::new(),
        value,
        serializable,
    }))
}

pub(crate) fn new_mutable(value: Datum, serializable: bool) -> Value {
    Value(Rc::new(MutableValue {
        hub: EventHub::new(),
        value: RefCell::new(value),
        serializable,
    }))
}
