use glam::DVec3;
use slotmap::{DefaultKey, SlotMap};
use crate::error::NebulaError;
use crate::math::{Aabb, Frustum};
use super::*;
use super::super::spatial_index::SpatialIndex;

fn make_aabb(min: DVec3, max: DVec3) -> Aabb {
    Aabb::new(min, max)
}

fn seed_bounds() -> Aabb {
    make_aabb(DVec3::splat(-100.0), DVec3::splat(100.0))
}

fn make_octree() -> HierarchicalOctree<DefaultKey> {
    HierarchicalOctree::new(seed_bounds(), 6).unwrap()
}

fn make_keys(count: usize) -> Vec<DefaultKey> {
    let mut source: SlotMap<DefaultKey, ()> = SlotMap::new();
    (0..count).map(|_| source.insert(())).collect()
}

fn collect_volume(
    octree: &mut HierarchicalOctree<DefaultKey>,
    volume: &Aabb,
) -> Vec<DefaultKey> {
    let mut found = Vec::new();
    octree.query_volume(volume, &mut |key, _| found.push(*key));
    found
}

fn everything() -> Aabb {
    make_aabb(DVec3::splat(-1e6), DVec3::splat(1e6))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_rejects_inconsistent_bounds() {
    let backwards = make_aabb(DVec3::splat(10.0), DVec3::splat(-10.0));
    assert!(matches!(
        HierarchicalOctree::<DefaultKey>::new(backwards, 4),
        Err(NebulaError::InvalidExtent(_))
    ));
}

// ============================================================================
// Insert and query
// ============================================================================

#[test]
fn test_insert_and_query_single_item() {
    let keys = make_keys(1);
    let mut octree = make_octree();
    let bounds = make_aabb(DVec3::new(-1.0, -1.0, -10.0), DVec3::new(1.0, 1.0, -8.0));
    octree.insert(keys[0], &bounds);

    let found = collect_volume(&mut octree, &make_aabb(DVec3::splat(-2.0), DVec3::splat(0.0)));
    assert_eq!(found, vec![keys[0]]);
}

#[test]
fn test_query_skips_disjoint_octants() {
    let keys = make_keys(2);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(50.0), DVec3::splat(55.0)));
    octree.insert(keys[1], &make_aabb(DVec3::splat(-55.0), DVec3::splat(-50.0)));

    let found = collect_volume(&mut octree, &make_aabb(DVec3::splat(40.0), DVec3::splat(60.0)));
    assert_eq!(found, vec![keys[0]]);
}

#[test]
fn test_no_duplicates_in_results() {
    // A box straddling the root center lives in the root node
    let keys = make_keys(1);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(-1.0), DVec3::splat(1.0)));

    let found = collect_volume(&mut octree, &everything());
    assert_eq!(found, vec![keys[0]]);
}

// ============================================================================
// Unbounded root
// ============================================================================

#[test]
fn test_insert_outside_seed_bounds_grows_root() {
    let keys = make_keys(2);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(1.0), DVec3::splat(2.0)));
    // Far outside the seed bounds in every axis
    octree.insert(keys[1], &make_aabb(DVec3::splat(-900.0), DVec3::splat(-890.0)));

    assert_eq!(octree.len(), 2);
    let found = collect_volume(&mut octree, &everything());
    assert_eq!(found.len(), 2);
    assert!(found.contains(&keys[0]));
    assert!(found.contains(&keys[1]));

    // Targeted queries still separate them
    let found =
        collect_volume(&mut octree, &make_aabb(DVec3::splat(-901.0), DVec3::splat(-889.0)));
    assert_eq!(found, vec![keys[1]]);
}

#[test]
fn test_growth_in_positive_direction() {
    let keys = make_keys(1);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(500.0), DVec3::splat(510.0)));

    let found = collect_volume(&mut octree, &make_aabb(DVec3::splat(499.0), DVec3::splat(511.0)));
    assert_eq!(found, vec![keys[0]]);
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_moves_item() {
    let keys = make_keys(1);
    let mut octree = make_octree();
    let key = octree.insert(
        keys[0],
        &make_aabb(DVec3::splat(50.0), DVec3::splat(60.0)),
    );

    let new_bounds = make_aabb(DVec3::splat(-60.0), DVec3::splat(-50.0));
    assert!(octree.update(key, &new_bounds));

    let old_spot = collect_volume(&mut octree, &make_aabb(DVec3::splat(49.0), DVec3::splat(61.0)));
    assert!(old_spot.is_empty());
    let new_spot =
        collect_volume(&mut octree, &make_aabb(DVec3::splat(-61.0), DVec3::splat(-49.0)));
    assert_eq!(new_spot, vec![keys[0]]);
}

#[test]
fn test_update_in_place_keeps_node() {
    let keys = make_keys(1);
    let mut octree = make_octree();
    let key = octree.insert(keys[0], &make_aabb(DVec3::splat(50.0), DVec3::splat(60.0)));

    // Small wiggle within the same octant
    assert!(octree.update(key, &make_aabb(DVec3::splat(51.0), DVec3::splat(61.0))));
    let found = collect_volume(&mut octree, &make_aabb(DVec3::splat(60.5), DVec3::splat(62.0)));
    assert_eq!(found, vec![keys[0]]);
}

#[test]
fn test_update_with_stale_key_returns_false() {
    let keys = make_keys(1);
    let mut octree = make_octree();
    let key = octree.insert(keys[0], &make_aabb(DVec3::ZERO, DVec3::splat(1.0)));
    assert!(octree.remove_key(key));
    assert!(!octree.update(key, &make_aabb(DVec3::ZERO, DVec3::splat(2.0))));
}

// ============================================================================
// Remove and prune
// ============================================================================

#[test]
fn test_remove_by_item() {
    let keys = make_keys(2);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(10.0), DVec3::splat(11.0)));
    octree.insert(keys[1], &make_aabb(DVec3::splat(-11.0), DVec3::splat(-10.0)));

    assert!(octree.remove(&keys[0]));
    assert!(!octree.remove(&keys[0]));
    assert_eq!(octree.len(), 1);

    let found = collect_volume(&mut octree, &everything());
    assert_eq!(found, vec![keys[1]]);
}

#[test]
fn test_emptied_subtrees_are_pruned_before_queries() {
    let keys = make_keys(8);
    let mut octree = make_octree();
    for (i, &key) in keys.iter().enumerate() {
        let at = 10.0 + i as f64 * 7.0;
        octree.insert(key, &make_aabb(DVec3::splat(at), DVec3::splat(at + 2.0)));
    }
    for key in &keys[..7] {
        assert!(octree.remove(key));
    }

    // The prune pass at query entry must leave the survivor reachable
    let found = collect_volume(&mut octree, &everything());
    assert_eq!(found, vec![keys[7]]);

    // Reinsertion after pruning still works
    octree.insert(keys[0], &make_aabb(DVec3::splat(10.0), DVec3::splat(12.0)));
    assert_eq!(collect_volume(&mut octree, &everything()).len(), 2);
}

// ============================================================================
// Clear
// ============================================================================

#[test]
fn test_clear_both_modes() {
    let keys = make_keys(3);
    for fast in [true, false] {
        let mut octree = make_octree();
        for (i, &key) in keys.iter().enumerate() {
            let at = i as f64 * 20.0;
            octree.insert(key, &make_aabb(DVec3::splat(at), DVec3::splat(at + 5.0)));
        }
        // Grow the root too, then clear everything away
        octree.insert(keys[0], &make_aabb(DVec3::splat(400.0), DVec3::splat(410.0)));

        octree.clear(fast);
        assert!(octree.is_empty());
        assert!(collect_volume(&mut octree, &everything()).is_empty());

        octree.insert(keys[1], &make_aabb(DVec3::ZERO, DVec3::splat(1.0)));
        assert_eq!(collect_volume(&mut octree, &everything()), vec![keys[1]]);
    }
}

// ============================================================================
// Frustum queries
// ============================================================================

#[test]
fn test_frustum_query_culls_hidden_items() {
    let keys = make_keys(2);
    let mut octree = make_octree();
    // In front of the camera
    octree.insert(keys[0], &make_aabb(DVec3::new(-1.0, -1.0, -10.0), DVec3::new(1.0, 1.0, -8.0)));
    // Behind the camera
    octree.insert(keys[1], &make_aabb(DVec3::new(-1.0, -1.0, 8.0), DVec3::new(1.0, 1.0, 10.0)));

    let frustum = Frustum::perspective(45.0, 1.0, 0.1, 50.0).unwrap();
    let mut found = Vec::new();
    octree.query_frustum(&frustum, &mut |key, _| found.push(*key));

    assert_eq!(found, vec![keys[0]]);
}

#[test]
fn test_frustum_query_reports_each_item_once() {
    let keys = make_keys(3);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(-1.0), DVec3::splat(1.0)));
    octree.insert(keys[1], &make_aabb(DVec3::new(-2.0, -2.0, -30.0), DVec3::new(2.0, 2.0, -25.0)));
    octree.insert(keys[2], &make_aabb(DVec3::new(5.0, 5.0, -40.0), DVec3::new(8.0, 8.0, -35.0)));

    let frustum = Frustum::perspective(90.0, 1.0, 0.5, 80.0).unwrap();
    let mut found = Vec::new();
    octree.query_frustum(&frustum, &mut |key, _| found.push(*key));

    for key in &found {
        assert_eq!(found.iter().filter(|k| *k == key).count(), 1);
    }
}

// ============================================================================
// Pair queries
// ============================================================================

#[test]
fn test_pairs_across_tree_levels() {
    let keys = make_keys(3);
    let mut octree = make_octree();
    // Straddles the root center: stays at the root
    octree.insert(keys[0], &make_aabb(DVec3::splat(-2.0), DVec3::splat(2.0)));
    // Deep inside one octant, overlapping the big box
    octree.insert(keys[1], &make_aabb(DVec3::splat(1.0), DVec3::splat(1.5)));
    // Deep inside another octant, disjoint from both
    octree.insert(keys[2], &make_aabb(DVec3::splat(-80.0), DVec3::splat(-75.0)));

    let mut pairs = Vec::new();
    octree.query_pairs(&mut |a, _, b, _| pairs.push((*a, *b)));

    assert_eq!(pairs.len(), 1);
    let (a, b) = pairs[0];
    assert!(
        (a == keys[0] && b == keys[1]) || (a == keys[1] && b == keys[0]),
        "unexpected pair {:?}",
        pairs[0]
    );
}

#[test]
fn test_pairs_within_one_node() {
    let keys = make_keys(2);
    let mut octree = make_octree();
    octree.insert(keys[0], &make_aabb(DVec3::splat(-3.0), DVec3::splat(3.0)));
    octree.insert(keys[1], &make_aabb(DVec3::splat(-1.0), DVec3::splat(1.0)));

    let mut pairs = 0;
    octree.query_pairs(&mut |_, _, _, _| pairs += 1);
    assert_eq!(pairs, 1);
}
