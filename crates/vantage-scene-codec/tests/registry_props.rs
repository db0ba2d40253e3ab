// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use vantage_proto::{ErrorCode, ObjectFlags, ShapeKind};
use vantage_scene_codec::ShapeRegistry;
use vantage_shapes::{Shape, ShapeBuilder, Sphere};

#[derive(Debug, Clone)]
enum Op {
    Create { id: u32, replace: bool },
    Destroy(u32),
    EndFrame { persist: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..6, any::<bool>()).prop_map(|(id, replace)| Op::Create { id, replace }),
        (0u32..6).prop_map(Op::Destroy),
        any::<bool>().prop_map(|persist| Op::EndFrame { persist }),
    ]
}

const SPHERE: u16 = ShapeKind::Sphere.routing_id();

proptest! {
    #[test]
    fn registry_matches_a_set_model(ops in prop::collection::vec(op(), 1..64)) {
        let mut registry = ShapeRegistry::new();
        let mut live = BTreeSet::new();
        let mut transients = 0usize;

        for op in ops {
            match op {
                Op::Create { id, replace } => {
                    let shape = Shape::from(Sphere::new(id).with_flag(ObjectFlags::REPLACE, replace));
                    let result = registry.create(shape).map(|_| ());
                    if id == 0 {
                        prop_assert!(result.is_ok());
                        transients += 1;
                    } else if live.contains(&id) && !replace {
                        prop_assert_eq!(result.unwrap_err().code(), ErrorCode::DuplicateShape);
                    } else {
                        prop_assert!(result.is_ok());
                        live.insert(id);
                    }
                }
                Op::Destroy(id) => {
                    let result = registry.destroy(SPHERE, id);
                    if id != 0 && live.remove(&id) {
                        prop_assert_eq!(result.unwrap().object_id(), id);
                    } else {
                        prop_assert_eq!(result.unwrap_err().code(), ErrorCode::InvalidObjectId);
                    }
                }
                Op::EndFrame { persist } => {
                    let dropped = registry.end_frame(persist);
                    if persist {
                        prop_assert_eq!(dropped, 0);
                    } else {
                        prop_assert_eq!(dropped, transients);
                        transients = 0;
                    }
                }
            }
            prop_assert_eq!(registry.persistent_len(), live.len());
            prop_assert_eq!(registry.transient_len(), transients);
        }
        for id in &live {
            prop_assert!(registry.get(SPHERE, *id).is_some());
        }
    }
}
