//! Derived read-only values
//!
//! A mapped value holds an upstream Value or Collection and a pure
//! projection. It is never independently stateful: every read recomputes
//! from upstream, and upstream `change`/`serializable-change` re-emit here
//! with the projected payload. Serializability propagates from upstream.
//!
//! Mapping a collection degrades it to a scalar Value; the live
//! collection-shaped projection is `filter` (see `filtered`).

use std::rc::{Rc, Weak};

use serde_json::Value as Json;

use rivus_core::{EventHub, EventKind, Meta, RivusError, RivusResult};

use crate::value::ValueLike;
use crate::{Collection, Datum, Payload, Record, Value};

struct MappedValue {
    hub: EventHub<Payload>,
    /// Recompute the projection from upstream's current state
    read: Box<dyn Fn() -> Datum>,
    /// Upstream serializability probe
    serializable: Box<dyn Fn() -> bool>,
}

impl ValueLike for MappedValue {
    fn hub(&self) -> &EventHub<Payload> {
        &self.hub
    }

    fn get(&self) -> Datum {
        (self.read)()
    }

    fn set(&self, _datum: Datum, _meta: Option<&Meta>) -> RivusResult<()> {
        Err(RivusError::InvalidOperation(
            "a mapped value cannot be assigned to",
        ))
    }

    fn serialize(&self) -> RivusResult<Json> {
        if (self.serializable)() {
            (self.read)().serialize()
        } else {
            Err(RivusError::NotSerializable)
        }
    }

    fn is_serializable(&self) -> bool {
        (self.serializable)()
    }
}

/// Re-emit upstream changes through the projection. Emission happens right
/// after the upstream mutation, so recomputing from upstream state observes
/// exactly the emitted change. The listeners hold the projection weakly;
/// once every handle to it is dropped they fall silent.
fn reemit_listener(mapped: &Rc<MappedValue>, kind: EventKind) -> rivus_core::Listener<Payload> {
    let weak: Weak<MappedValue> = Rc::downgrade(mapped);
    Rc::new(move |_payload: &Payload, meta: Option<&Meta>| {
        if let Some(mapped) = weak.upgrade() {
            let projected = Payload::Datum((mapped.read)());
            mapped.hub.emit(kind, &projected, meta);
        }
    })
}

pub(crate) fn map_value(upstream: &Value, f: impl Fn(&Datum) -> Datum + 'static) -> Value {
    let read = {
        let upstream = upstream.clone();
        Box::new(move || f(&upstream.get()))
    };
    let serializable = {
        let upstream = upstream.clone();
        Box::new(move || upstream.is_serializable())
    };
    let mapped = Rc::new(MappedValue {
        hub: EventHub::new(),
        read,
        serializable,
    });
    upstream.on(
        EventKind::Change,
        reemit_listener(&mapped, EventKind::Change),
    );
    upstream.on(
        EventKind::SerializableChange,
        reemit_listener(&mapped, EventKind::SerializableChange),
    );
    Value::from_like(mapped)
}

pub(crate) fn map_collection(
    upstream: &Collection,
    f: impl Fn(&[Record]) -> Datum + 'static,
) -> Value {
    let read = {
        let upstream = upstream.clone();
        Box::new(move || f(&upstream.get()))
    };
    let serializable = {
        let upstream = upstream.clone();
        Box::new(move || upstream.is_serializable())
    };
    let mapped = Rc::new(MappedValue {
        hub: EventHub::new(),
        read,
        serializable,
    });
    upstream.on(
        EventKind::Change,
        reemit_listener(&mapped, EventKind::Change),
    );
    upstream.on(
        EventKind::SerializableChange,
        reemit_listener(&mapped, EventKind::SerializableChange),
    );
    Value::from_like(mapped)
}
