//! Event capture for assertions
//!
//! The recorder hands out listeners that append every delivery to a shared
//! log. Tests attach it to any observable and assert on the captured kinds,
//! payloads, and meta tokens.

use std::cell::RefCell;
use std::rc::Rc;

use rivus_core::{EventKind, Listener, Meta};
use rivus_state::{Collection, Payload, Record, Value};

/// Every kind the layer can emit
pub const ALL_KINDS: [EventKind; 7] = [
    EventKind::Change,
    EventKind::SerializableChange,
    EventKind::ItemChange,
    EventKind::ItemSerializableChange,
    EventKind::ItemAdd,
    EventKind::ItemRemove,
    EventKind::Set,
];

/// One captured delivery
#[derive(Clone, Debug)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub payload: Payload,
    pub meta: Option<Meta>,
}

/// Shared event log
#[derive(Clone, Default)]
pub struct EventRecorder {
    log: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        EventRecorder::default()
    }

    /// A listener that records every delivery of `kind`
    pub fn listener(&self, kind: EventKind) -> Listener<Payload> {
        let log = Rc::clone(&self.log);
        Rc::new(move |payload: &Payload, meta: Option<&Meta>| {
            log.borrow_mut().push(RecordedEvent {
                kind,
                payload: payload.clone(),
                meta: meta.cloned(),
            });
        })
    }

    pub fn watch_value(&self, value: &Value) {
        for kind in ALL_KINDS {
            value.on(kind, self.listener(kind));
        }
    }

    pub fn watch_collection(&self, collection: &Collection) {
        for kind in ALL_KINDS {
            collection.on(kind, self.listener(kind));
        }
    }

    pub fn watch_record(&self, record: &Record) {
        for kind in ALL_KINDS {
            record.on(kind, self.listener(kind));
        }
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log.borrow().clone()
    }

    /// Captured kinds in delivery order
    pub fn kinds(&self) -> Vec<EventKind> {
        self.log.borrow().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.log.borrow().iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}
