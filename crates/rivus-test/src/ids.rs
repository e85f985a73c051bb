//! Deterministic id sources

use std::cell::Cell;
use std::rc::Rc;

use rivus_core::{IdSource, ObjectId, SharedIdSource};

/// Counting id source: `00..00`, `00..01`, ... as 32 uppercase hex chars,
/// matching the shape of generated ids while staying reproducible.
pub struct SequentialIds {
    counter: Cell<u64>,
}

impl SequentialIds {
    pub fn new() -> Self {
        SequentialIds {
            counter: Cell::new(0),
        }
    }

    pub fn starting_at(first: u64) -> Self {
        SequentialIds {
            counter: Cell::new(first),
        }
    }

    /// Shared handle ready for `ObjectType::with_id_source`
    pub fn shared() -> SharedIdSource {
        Rc::new(SequentialIds::new())
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        SequentialIds::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> ObjectId {
        let n = self.counter.get();
        self.counter.set(n + 1);
        ObjectId::from(format!("{n:032X}").as_str())
    }
}
