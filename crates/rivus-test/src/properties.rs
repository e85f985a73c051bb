//! Property tests over the primitive semantics

use proptest::prelude::*;

use rivus_core::{EventKind, IdSource, ObjectId, PrimitiveKind, RandomIds, Scalar};
use rivus_state::mutable;
use serde_json::{json, Value as Json};

use crate::{point_type, EventRecorder, SequentialIds};

proptest! {
    /// Setting an equal value never emits; setting a different one emits
    /// exactly one change (plus one serializable-change).
    #[test]
    fn prop_change_detection_is_by_equality(initial in proptest::num::f64::NORMAL,
                                            other in proptest::num::f64::NORMAL) {
        let value = mutable(PrimitiveKind::Number)
            .create(Some(&json!(initial)))
            .unwrap();
        let recorder = EventRecorder::new();
        recorder.watch_value(&value);

        value.set(initial, None).unwrap();
        prop_assert!(recorder.is_empty());

        value.set(other, None).unwrap();
        let expected = if other == initial { 0 } else { 1 };
        prop_assert_eq!(recorder.count(EventKind::Change), expected);
        prop_assert_eq!(recorder.count(EventKind::SerializableChange), expected);
    }

    /// Scalars survive the trip through plain data unchanged.
    #[test]
    fn prop_scalar_plain_data_round_trip(n in proptest::num::f64::NORMAL, s in ".{0,32}", b in any::<bool>()) {
        for scalar in [Scalar::Number(n), Scalar::Text(s), Scalar::Bool(b)] {
            let kind = scalar.kind();
            let plain = scalar.to_json();
            prop_assert_eq!(kind.from_json(Some(&plain)), scalar);
        }
    }

    /// Membership stays id-unique and insertion-ordered under arbitrary
    /// add/remove sequences.
    #[test]
    fn prop_membership_invariants(ops in proptest::collection::vec(0u8..4, 1..40)) {
        let ty = point_type(SequentialIds::shared());
        let coll = rivus_state::mutable_collection(ty.clone()).create(None).unwrap();
        let mut expected: Vec<ObjectId> = Vec::new();
        let mut serial = 0i64;

        for op in ops {
            match op {
                // Add a fresh member
                0 | 1 => {
                    let raw = json!({"id": serial, "x": 0, "y": 0});
                    serial += 1;
                    let member = ty.create(Some(&raw)).unwrap();
                    expected.push(member.id().clone());
                    coll.add(member, None).unwrap();
                }
                // Re-add the oldest member: a no-op
                2 => {
                    if let Some(id) = expected.first() {
                        let member = coll.get_by_id(id).unwrap();
                        coll.add(member, None).unwrap();
                    }
                }
                // Remove the oldest member
                _ => {
                    if !expected.is_empty() {
                        let id = expected.remove(0);
                        let member = coll.get_by_id(&id).unwrap();
                        coll.remove(&member, None).unwrap();
                    }
                }
            }
            let order: Vec<ObjectId> = coll.get().iter().map(|m| m.id().clone()).collect();
            prop_assert_eq!(&order, &expected);
        }
    }
}

#[test]
fn test_generated_ids_do_not_collide_in_practice() {
    let mut seen = std::collections::HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(RandomIds.next_id()));
    }
}

#[test]
fn test_id_json_round_trip() {
    for id in [ObjectId::from("CAFE"), ObjectId::from(42), ObjectId::from(0)] {
        let plain: Json = id.to_json();
        assert_eq!(ObjectId::from_json(&plain), Some(id));
    }
}
