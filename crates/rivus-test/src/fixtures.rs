//! Shared model fixtures
//!
//! Small schemas used across integration tests and benchmarks. All of them
//! take an id source so tests stay reproducible.

use rivus_core::{PrimitiveKind, SharedIdSource};
use rivus_state::{mutable, mutable_collection, object, oneof, ObjectType, OneOfType};

use crate::SequentialIds;

/// `{x, y}` with mutable numeric fields
pub fn point_type(ids: SharedIdSource) -> ObjectType {
    object([
        ("x", mutable(PrimitiveKind::Number).into()),
        ("y", mutable(PrimitiveKind::Number).into()),
    ])
    .expect("point schema")
    .with_id_source(ids)
}

/// Circle/square record types and the union over them
pub struct ShapeTypes {
    pub circle: ObjectType,
    pub square: ObjectType,
    pub shape: OneOfType,
}

pub fn shape_types(ids: SharedIdSource) -> ShapeTypes {
    let circle = object([("radius", mutable(PrimitiveKind::Number).into())])
        .expect("circle schema")
        .with_id_source(ids.clone());
    let square = object([("side", mutable(PrimitiveKind::Number).into())])
        .expect("square schema")
        .with_id_source(ids);
    let shape = oneof([("circle", circle.clone()), ("square", square.clone())]);
    ShapeTypes {
        circle,
        square,
        shape,
    }
}

/// A todo item and the list that owns a collection of them
pub struct TodoTypes {
    pub item: ObjectType,
    pub list: ObjectType,
}

pub fn todo_types(ids: SharedIdSource) -> TodoTypes {
    let item = object([
        ("title", mutable(PrimitiveKind::Text).into()),
        ("done", mutable(PrimitiveKind::Bool).into()),
    ])
    .expect("todo item schema")
    .with_id_source(ids.clone());

    let list = object([
        ("name", mutable(PrimitiveKind::Text).into()),
        ("items", mutable_collection(item.clone()).into()),
    ])
    .expect("todo list schema")
    .with_id_source(ids);

    TodoTypes { item, list }
}

/// The fixtures above with a fresh sequential id source
pub fn deterministic_ids() -> SharedIdSource {
    SequentialIds::shared()
}
