//! End-to-end scenarios across the observable hierarchy

use rivus_core::{EventKind, Meta, ObjectId, PrimitiveKind};
use rivus_state::{
    constant_collection, listener, mutable, Datum, Payload, RivusError,
};
use serde_json::json;

use crate::{point_type, shape_types, todo_types, EventRecorder, SequentialIds};

#[test]
fn scenario_mutable_number_lifecycle() {
    let counter = mutable(PrimitiveKind::Number)
        .create(Some(&json!(0)))
        .unwrap();
    assert_eq!(counter.get(), Datum::from(0.0));

    let recorder = EventRecorder::new();
    recorder.watch_value(&counter);

    counter.set(6.0, None).unwrap();
    assert_eq!(counter.get(), Datum::from(6.0));
    assert_eq!(recorder.count(EventKind::Change), 1);

    counter.set(6.0, None).unwrap();
    assert_eq!(recorder.count(EventKind::Change), 1);
}

#[test]
fn test_member_change_bubbles_to_owning_record() {
    let types = todo_types(SequentialIds::shared());
    let list = types
        .list
        .create(Some(&json!({
            "name": "inbox",
            "items": [{"title": "write docs", "done": false}],
        })))
        .unwrap();

    let list_events = EventRecorder::new();
    list_events.watch_record(&list);
    let items = list.collection("items").unwrap();
    let item_events = EventRecorder::new();
    item_events.watch_collection(&items);

    let todo = items.get()[0].clone();
    todo.value("done").unwrap().set(true, None).unwrap();

    // item change -> collection aggregation -> list record change
    assert_eq!(item_events.count(EventKind::ItemChange), 1);
    assert!(item_events.count(EventKind::Change) >= 1);
    assert!(list_events.count(EventKind::Change) >= 1);
}

#[test]
fn test_meta_token_survives_every_hop() {
    let types = todo_types(SequentialIds::shared());
    let list = types
        .list
        .create(Some(&json!({
            "name": "inbox",
            "items": [{"title": "a", "done": false}],
        })))
        .unwrap();

    let recorder = EventRecorder::new();
    recorder.watch_record(&list);
    let items = list.collection("items").unwrap();
    recorder.watch_collection(&items);

    let meta = Meta::new("user-toggle");
    let todo = items.get()[0].clone();
    todo.value("done").unwrap().set(true, Some(&meta)).unwrap();

    assert!(!recorder.is_empty());
    for event in recorder.events() {
        assert_eq!(event.meta.as_ref(), Some(&meta));
    }
}

#[test]
fn test_whole_model_round_trip() {
    let types = todo_types(SequentialIds::shared());
    let plain = json!({
        "id": "LIST",
        "name": "groceries",
        "items": [
            {"id": "A", "title": "milk", "done": false},
            {"id": "B", "title": "eggs", "done": true},
        ],
    });
    let list = types.list.create(Some(&plain)).unwrap();
    assert_eq!(list.serialize().unwrap(), plain);

    let rebuilt = types.list.create(Some(&list.serialize().unwrap())).unwrap();
    assert_eq!(rebuilt.id(), list.id());
    assert_eq!(rebuilt.serialize().unwrap(), plain);
}

#[test]
fn test_filtered_active_view_tracks_completion() {
    let types = todo_types(SequentialIds::shared());
    let list = types
        .list
        .create(Some(&json!({
            "name": "inbox",
            "items": [
                {"id": "A", "title": "a", "done": false},
                {"id": "B", "title": "b", "done": true},
            ],
        })))
        .unwrap();
    let items = list.collection("items").unwrap();
    let active = items.filter(|todo| {
        todo.value("done").map(|done| done.get() == Datum::from(false)) == Some(true)
    });
    assert_eq!(active.len(), 1);
    assert!(active.contains(&ObjectId::from("A")));

    // Completing the active item removes it from the view
    let recorder = EventRecorder::new();
    recorder.watch_collection(&active);
    let a = items.get_by_id(&ObjectId::from("A")).unwrap();
    a.value("done").unwrap().set(true, None).unwrap();
    assert_eq!(active.len(), 0);
    assert_eq!(recorder.count(EventKind::ItemRemove), 1);

    // Reopening the other one brings it back
    let b = items.get_by_id(&ObjectId::from("B")).unwrap();
    b.value("done").unwrap().set(false, None).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(recorder.count(EventKind::ItemAdd), 1);
}

#[test]
fn test_idempotent_add_emits_nothing() {
    let ty = point_type(SequentialIds::shared());
    let coll = rivus_state::mutable_collection(ty.clone()).create(None).unwrap();
    let p = ty.create(Some(&json!({"id": "P", "x": 1, "y": 1}))).unwrap();

    coll.add(p.clone(), None).unwrap();
    let recorder = EventRecorder::new();
    recorder.watch_collection(&coll);

    coll.add(p, None).unwrap();
    assert!(recorder.is_empty());
    assert_eq!(coll.len(), 1);
}

#[test]
fn test_union_field_serializes_inside_record() {
    let ids = SequentialIds::shared();
    let shapes = shape_types(ids.clone());
    let drawing = rivus_state::object([
        ("name", mutable(PrimitiveKind::Text).into()),
        ("outline", rivus_state::Template::from(shapes.shape.clone())),
    ])
    .unwrap()
    .with_id_source(ids);

    let record = drawing
        .create(Some(&json!({
            "id": "D",
            "name": "logo",
            "outline": {"type": "circle", "value": {"id": "C", "radius": 3}},
        })))
        .unwrap();

    let outline = record.field("outline").unwrap().as_union().unwrap().clone();
    assert_eq!(outline.tag(), "circle");
    assert!(outline.value().is_of_type(&shapes.circle));

    assert_eq!(
        record.serialize().unwrap(),
        json!({
            "id": "D",
            "name": "logo",
            "outline": {"type": "circle", "value": {"id": "C", "radius": 3}},
        })
    );
}

#[test]
fn test_constant_collection_keeps_construction_order() {
    let ty = point_type(SequentialIds::shared());
    let coll = constant_collection(ty)
        .create(Some(&json!([
            {"id": 2, "x": 0, "y": 0},
            {"id": 0, "x": 0, "y": 0},
            {"id": 1, "x": 0, "y": 0},
        ])))
        .unwrap();
    let order: Vec<ObjectId> = coll.get().iter().map(|m| m.id().clone()).collect();
    assert_eq!(
        order,
        vec![ObjectId::from(2), ObjectId::from(0), ObjectId::from(1)]
    );
}

#[test]
fn test_detached_members_stop_aggregating() {
    let ty = point_type(SequentialIds::shared());
    let coll = rivus_state::mutable_collection(ty.clone())
        .create(Some(&json!([{"id": 0, "x": 1, "y": 1}])))
        .unwrap();
    let old = coll.get_by_id(&ObjectId::from(0)).unwrap();

    coll.set(
        vec![ty.create(Some(&json!({"id": 1, "x": 2, "y": 2}))).unwrap()],
        None,
    )
    .unwrap();

    let recorder = EventRecorder::new();
    recorder.watch_collection(&coll);
    old.value("x").unwrap().set(50.0, None).unwrap();
    assert!(recorder.is_empty());
}

#[test]
fn test_reentrant_mutation_across_structures() {
    // A listener reacting to one value mutates a sibling; both settle on the
    // same stack without panicking.
    let ty = point_type(SequentialIds::shared());
    let record = ty.create(Some(&json!({"x": 0, "y": 0}))).unwrap();
    let x = record.value("x").unwrap();
    let y = record.value("y").unwrap();
    {
        let y = y.clone();
        x.on(
            EventKind::Change,
            listener(move |payload: &Payload, _| {
                if let Some(n) = payload.as_datum().and_then(|d| d.as_number()) {
                    y.set(n * 2.0, None).unwrap();
                }
            }),
        );
    }
    x.set(3.0, None).unwrap();
    assert_eq!(y.get(), Datum::from(6.0));
}

#[test]
fn test_mapped_view_over_collection_stays_current() {
    let types = todo_types(SequentialIds::shared());
    let list = types
        .list
        .create(Some(&json!({"name": "inbox", "items": []})))
        .unwrap();
    let items = list.collection("items").unwrap();
    let remaining = items.map(|members| {
        let open = members
            .iter()
            .filter(|m| m.value("done").map(|d| d.get()) == Some(Datum::from(false)))
            .count();
        Datum::from(open as f64)
    });

    assert_eq!(remaining.get(), Datum::from(0.0));
    items
        .add(
            types
                .item
                .create(Some(&json!({"title": "a", "done": false})))
                .unwrap(),
            None,
        )
        .unwrap();
    assert_eq!(remaining.get(), Datum::from(1.0));
    assert!(matches!(
        remaining.set(0.0, None),
        Err(RivusError::InvalidOperation(_))
    ));
}
