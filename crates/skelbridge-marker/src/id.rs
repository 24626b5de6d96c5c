//! Stable marker ids
//!
//! The bus treats a repeated (namespace, id) pair as the same marker moving,
//! so ids must depend only on the skeleton id and the joint.
//!
//! - Vocabulary joints: `skeleton_id * 100 + landmark index`
//! - Named joints: `skeleton_id * 100 + djb2(name) % 100`
//!
//! The named scheme can collide for arbitrary names. It is collision-free
//! over the 17 vocabulary names and the live producer's short names.

use skelbridge_core::{JointKey, SkeletonId};

use crate::MarkerId;

/// Id slots reserved per skeleton
pub const IDS_PER_SKELETON: i64 = 100;

/// djb2 string hash (h * 33 + byte, wrapping)
pub fn djb2(name: &str) -> u32 {
    name.bytes()
        .fold(5381u32, |h, b| h.wrapping_mul(33).wrapping_add(b as u32))
}

/// Slot of a joint within its skeleton's id block
pub fn joint_slot(key: &JointKey) -> i64 {
    match key {
        JointKey::Landmark(landmark) => landmark.index() as i64,
        JointKey::Named(name) => (djb2(name) % IDS_PER_SKELETON as u32) as i64,
    }
}

/// Marker id for a (skeleton, joint) pair
pub fn marker_id(skeleton_id: SkeletonId, key: &JointKey) -> MarkerId {
    skeleton_id
        .wrapping_mul(IDS_PER_SKELETON)
        .wrapping_add(joint_slot(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use skelbridge_core::{Landmark, LANDMARK_COUNT};
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_ids() {
        assert_eq!(marker_id(0, &Landmark::Nose.into()), 0);
        assert_eq!(marker_id(3, &Landmark::LeftWrist.into()), 309);
        assert_eq!(marker_id(12, &Landmark::RightAnkle.into()), 1216);
    }

    #[test]
    fn test_djb2_known_values() {
        assert_eq!(djb2(""), 5381);
        assert_eq!(djb2("Nose"), 2_089_401_466);
        assert_eq!(djb2("Left Wrist"), 2_996_018_345);
    }

    #[test]
    fn test_named_ids() {
        assert_eq!(marker_id(1, &JointKey::Named("Left Wrist".into())), 145);
        assert_eq!(marker_id(0, &JointKey::Named("LWrist".into())), 30);
        assert_eq!(marker_id(2, &JointKey::Named("Nose".into())), 266);
    }

    #[test]
    fn test_named_scheme_collision_free_over_known_names() {
        let mut names: Vec<&str> = Landmark::all().iter().map(|l| l.name()).collect();
        names.extend(Landmark::key_joints().iter().filter_map(|l| l.short_name()));
        names.sort_unstable();
        names.dedup();

        let slots: HashSet<i64> = names
            .iter()
            .map(|n| joint_slot(&JointKey::Named(n.to_string())))
            .collect();
        assert_eq!(slots.len(), names.len());
    }

    proptest! {
        #[test]
        fn prop_vocabulary_ids_unique_within_frame(ids in proptest::collection::hash_set(0i64..100, 1..10)) {
            let mut seen = HashSet::new();
            for skeleton in &ids {
                for landmark in Landmark::all() {
                    prop_assert!(seen.insert(marker_id(*skeleton, &(*landmark).into())));
                }
            }
            prop_assert_eq!(seen.len(), ids.len() * LANDMARK_COUNT);
        }

        #[test]
        fn prop_ids_stable(skeleton in 0i64..100, index in 0usize..LANDMARK_COUNT, name in "[A-Za-z ]{1,16}") {
            let landmark = Landmark::from_index(index).unwrap();
            prop_assert_eq!(marker_id(skeleton, &landmark.into()), marker_id(skeleton, &landmark.into()));

            let named = JointKey::Named(name);
            prop_assert_eq!(marker_id(skeleton, &named), marker_id(skeleton, &named.clone()));
            prop_assert_eq!(marker_id(skeleton, &named) / IDS_PER_SKELETON, skeleton);
        }
    }
}
