//! Todo Model Example
//!
//! Builds a reactive todo model, subscribes to it the way a UI binder
//! would, and mutates it with tagged meta tokens.

use rivus_core::{EventKind, Meta, PrimitiveKind};
use rivus_state::{
    listener, mutable, mutable_collection, object, Datum, Payload,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== RIVUS Todo Model Example ===\n");

    // 1. Define the schema
    println!("1. Defining the todo schema...");
    let todo = object([
        ("title", mutable(PrimitiveKind::Text).into()),
        ("done", mutable(PrimitiveKind::Bool).into()),
    ])
    .expect("todo schema");
    let list = object([
        ("name", mutable(PrimitiveKind::Text).into()),
        ("items", mutable_collection(todo.clone()).into()),
    ])
    .expect("list schema");

    // 2. Construct from plain data
    println!("\n2. Constructing the list from plain data...");
    let inbox = list
        .create(Some(&json!({
            "id": "INBOX",
            "name": "inbox",
            "items": [
                {"id": "A", "title": "write the docs", "done": false},
                {"id": "B", "title": "ship the release", "done": false},
            ],
        })))
        .expect("list instance");
    let items = inbox.collection("items").expect("items field");
    println!("   {} items", items.len());

    // 3. Subscribe the way a UI binder would
    println!("\n3. Subscribing to change events...");
    items.on(
        EventKind::ItemAdd,
        listener(|payload: &Payload, meta| {
            if let Some(member) = payload.as_member() {
                println!("   [item-add]    {:?} (meta: {:?})", member.id(), meta);
            }
        }),
    );
    items.on(
        EventKind::ItemRemove,
        listener(|payload: &Payload, meta| {
            if let Some(member) = payload.as_member() {
                println!("   [item-remove] {:?} (meta: {:?})", member.id(), meta);
            }
        }),
    );
    inbox.on(
        EventKind::Change,
        listener(|_: &Payload, meta| {
            println!("   [list change] (meta: {:?})", meta);
        }),
    );

    // 4. A live filtered view of the open items
    println!("\n4. Filtering to the open items...");
    let open = items.filter(|todo| {
        todo.value("done").map(|done| done.get()) == Some(Datum::from(false))
    });
    let open_count = open.map(|members| Datum::from(members.len() as f64));
    println!("   open items: {:?}", open_count.get());

    // 5. Mutate with meta tokens
    println!("\n5. Completing a todo (meta: user)...");
    let user = Meta::new("user");
    let first = items.get()[0].clone();
    first
        .value("done")
        .expect("done field")
        .set(true, Some(&user))
        .expect("mutable field");
    println!("   open items now: {:?}", open_count.get());

    println!("\n6. Adding a todo (meta: sync)...");
    let sync = Meta::new("sync");
    let incoming = todo
        .create(Some(&json!({"id": "C", "title": "triage issues", "done": false})))
        .expect("todo instance");
    items.add(incoming, Some(&sync)).expect("mutable collection");

    // 7. Serialize the whole model
    println!("\n7. Serializing...");
    let plain = inbox.serialize().expect("serializable model");
    println!("{}", serde_json::to_string_pretty(&plain).expect("json"));

    println!("\n=== Done ===");
}
