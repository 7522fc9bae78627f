//! Property tests for positional patches and snapshot reconciliation

use liveo_core::{
    apply_index_patch, reconcile, Competitor, Course, Delta, IndexPatch, RebaseReason, Reconciliation,
    ResultHash, ResultSnapshot,
};
use proptest::prelude::*;

/// Build a patch plus the sequence it must produce
///
/// `keep` decides which old items survive; each `(seed, value)` insertion lands
/// at `seed % (len + 1)` of the sequence built so far, so earlier inserts shift.
fn plan(old: &[u8], keep: &[bool], inserts: &[(usize, u8)]) -> (IndexPatch<u8>, Vec<u8>) {
    let mut output: Vec<(bool, u8)> = old
        .iter()
        .zip(keep)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| (false, *v))
        .collect();
    for &(seed, value) in inserts {
        let at = seed % (output.len() + 1);
        output.insert(at, (true, value));
    }

    let mut patch = IndexPatch::new();
    for (index, keep) in keep.iter().enumerate() {
        if !keep {
            patch = patch.remove(index);
        }
    }
    for (index, (added, value)) in output.iter().enumerate() {
        if *added {
            patch = patch.add(index, *value);
        }
    }
    (patch, output.into_iter().map(|(_, v)| v).collect())
}

fn old_with_mask() -> impl Strategy<Value = (Vec<u8>, Vec<bool>)> {
    prop::collection::vec(any::<u8>(), 0..24).prop_flat_map(|old| {
        let len = old.len();
        (Just(old), prop::collection::vec(any::<bool>(), len))
    })
}

fn competitor() -> impl Strategy<Value = Competitor> {
    (prop::sample::select(vec!["Ann", "Bob", "Cat", "Dan", "Eve"]), 0i64..5).prop_map(|(name, minutes)| {
        Competitor::new(name, minutes * 60_000_000_000)
    })
}

fn course() -> impl Strategy<Value = Course> {
    (
        prop::sample::select(vec!["Brown", "Blue", "Green", "Orange"]),
        prop::sample::select(vec!["", "3.2km"]),
        prop::collection::vec(competitor(), 0..6),
    )
        .prop_map(|(title, info, competitors)| Course::new(title).with_info(info).with_competitors(competitors))
}

fn snapshot() -> impl Strategy<Value = ResultSnapshot> {
    (
        any::<u64>(),
        prop::sample::select(vec!["Night Sprint", "Middle Distance"]),
        prop::collection::vec(course(), 0..5),
    )
        .prop_map(|(hash, title, courses)| ResultSnapshot::new(hash, title, courses))
}

proptest! {
    #[test]
    fn prop_patch_produces_planned_sequence(
        (old, keep) in old_with_mask(),
        inserts in prop::collection::vec((any::<usize>(), any::<u8>()), 0..12),
    ) {
        let (patch, expected) = plan(&old, &keep, &inserts);
        let new = apply_index_patch(&old, &patch).unwrap();

        prop_assert_eq!(new.len(), old.len() - patch.removed.len() + patch.added.len());
        for (position, item) in &patch.added {
            prop_assert_eq!(new[*position], *item);
        }
        prop_assert_eq!(new, expected);
    }

    #[test]
    fn prop_complement_patch_restores_original(
        (old, keep) in old_with_mask(),
        inserts in prop::collection::vec((any::<usize>(), any::<u8>()), 0..12),
    ) {
        let (patch, _) = plan(&old, &keep, &inserts);
        let new = apply_index_patch(&old, &patch).unwrap();

        let mut undo = IndexPatch::new();
        for position in patch.added.keys() {
            undo = undo.remove(*position);
        }
        for position in &patch.removed {
            undo = undo.add(*position, old[*position]);
        }

        prop_assert_eq!(apply_index_patch(&new, &undo).unwrap(), old);
    }

    #[test]
    fn prop_removed_past_end_is_rejected(old in prop::collection::vec(any::<u8>(), 0..8), extra in 0usize..4) {
        let patch = IndexPatch::new().remove(old.len() + extra);
        prop_assert!(apply_index_patch(&old, &patch).is_err());
    }

    #[test]
    fn prop_delta_round_trip(a in snapshot(), b in snapshot()) {
        let delta = a.delta_to(&b);
        prop_assert_eq!(reconcile(&a, &delta), Reconciliation::Applied(b));
    }

    #[test]
    fn prop_delta_survives_wire(a in snapshot(), b in snapshot()) {
        let text = serde_json::to_string(&a.delta_to(&b)).unwrap();
        let delta: Delta = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(reconcile(&a, &delta), Reconciliation::Applied(b));
    }

    #[test]
    fn prop_stale_delta_requires_rebase(a in snapshot(), b in snapshot(), skew in 1u64..1000) {
        let mut delta = a.delta_to(&b);
        delta.old = a.hash.0.wrapping_add(skew).into();
        let outcome = reconcile(&a, &delta);
        let is_hash_mismatch = matches!(
            outcome,
            Reconciliation::RebaseRequired(RebaseReason::HashMismatch { .. })
        );
        prop_assert!(is_hash_mismatch);
    }
}

#[test]
fn removed_item_does_not_occupy_an_output_slot() {
    let old = vec!['A', 'B', 'C'];
    let patch = IndexPatch::new().remove(0).add(1, 'D');
    assert_eq!(apply_index_patch(&old, &patch).unwrap(), vec!['B', 'D', 'C']);
}

#[test]
fn competitor_patches_follow_course_patch() {
    let current = ResultSnapshot::new(
        10,
        "Night Sprint",
        vec![Course::new("Brown").with_competitors(vec![Competitor::new("Ann", 600_000_000_000)])],
    );
    // A new course lands in front, so the old Brown course is index 1 afterwards.
    let delta = Delta::new(10, 11)
        .with_courses(IndexPatch::new().add(0, Course::new("Blue")))
        .with_competitors(1, IndexPatch::new().add(0, Competitor::new("Bob", 540_000_000_000)));

    let next = reconcile(&current, &delta).into_snapshot().unwrap();
    assert_eq!(next.hash, ResultHash(11));
    assert_eq!(next.courses[0].title, "Blue");
    assert!(next.courses[0].competitors.is_empty());
    let brown: Vec<&str> = next.courses[1].competitors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(brown, vec!["Bob", "Ann"]);
}

#[test]
fn wire_delta_from_server() {
    let current: ResultSnapshot = serde_json::from_str(
        r#"{"Hash":5,"Results":{"Title":"Night Sprint","Courses":[
            {"Title":"Brown","Info":"","Competitors":[{"Name":"Ann","Time":600000000000,"Valid":true}]}
        ]}}"#,
    )
    .unwrap();
    let delta: Delta = serde_json::from_str(
        r#"{"Old":5,"New":6,"Competitors":{"0":{"Added":{"1":{"Name":"Bob","Time":615000000000,"Valid":true}},"Removed":{}}}}"#,
    )
    .unwrap();

    let next = reconcile(&current, &delta).into_snapshot().unwrap();
    assert_eq!(next.hash, ResultHash(6));
    assert_eq!(next.courses[0].competitors[1].name, "Bob");
    assert_eq!(next.courses[0].competitors[1].display_time(), "10:15");
}
