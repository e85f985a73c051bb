//! RIVUS State - The observable primitive hierarchy
//!
//! This crate implements the reactive state layer:
//! - Single-slot observable values (`constant` / `mutable`)
//! - Id-keyed observable collections (`constant_collection` / `mutable_collection`)
//! - Structured record composition (`object`) with change aggregation
//! - Tagged unions over record types (`oneof`)
//! - Derived read-only projections (`map`) and live filtered views (`filter`)
//! - Plain-data serialization to JSON-compatible structures
//!
//! The layer is single-threaded and synchronous: instances are `Rc`-shared
//! handles, listeners run on the caller's stack, and a listener that mutates
//! the structure it reacts to recurses immediately (feedback loops are a
//! caller error).

pub mod collection;
pub mod datum;
pub mod filtered;
pub mod mapped;
pub mod record;
pub mod template;
pub mod union;
pub mod value;

pub use collection::*;
pub use datum::*;
pub use filtered::*;
pub use record::*;
pub use template::*;
pub use union::*;
pub use value::*;

pub use rivus_core::{
    listener, EventHub, EventKind, IdSource, Listener, Meta, ObjectId, PrimitiveKind, RandomIds,
    RivusError, RivusResult, Scalar, SharedIdSource,
};
