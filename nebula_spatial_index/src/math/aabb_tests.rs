use glam::{DMat4, DVec3};
use super::*;

fn make_aabb(min: DVec3, max: DVec3) -> Aabb {
    Aabb::new(min, max)
}

fn assert_vec_close(a: DVec3, b: DVec3, tolerance: f64) {
    assert!(
        (a - b).length() < tolerance,
        "vectors differ: {:?} vs {:?}",
        a,
        b
    );
}

// ============================================================================
// Containment and overlap
// ============================================================================

#[test]
fn test_contains() {
    let big = make_aabb(DVec3::splat(-10.0), DVec3::splat(10.0));
    let small = make_aabb(DVec3::splat(-1.0), DVec3::splat(1.0));
    let straddling = make_aabb(DVec3::splat(5.0), DVec3::splat(15.0));

    assert!(big.contains(&small));
    assert!(big.contains(&big)); // closed bounds: contains itself
    assert!(!small.contains(&big));
    assert!(!big.contains(&straddling));
}

#[test]
fn test_intersects() {
    let a = make_aabb(DVec3::splat(-2.0), DVec3::splat(2.0));
    let b = make_aabb(DVec3::splat(1.0), DVec3::splat(3.0));
    let c = make_aabb(DVec3::splat(5.0), DVec3::splat(7.0));
    let touching = make_aabb(DVec3::new(2.0, 0.0, 0.0), DVec3::new(3.0, 1.0, 1.0));

    assert!(a.intersects(&b));
    assert!(b.intersects(&a));
    assert!(!a.intersects(&c));
    assert!(a.intersects(&touching)); // face contact counts
}

// ============================================================================
// Intersection and union
// ============================================================================

#[test]
fn test_intersection_of_overlapping_boxes() {
    let a = make_aabb(DVec3::splat(0.0), DVec3::splat(4.0));
    let b = make_aabb(DVec3::splat(2.0), DVec3::splat(6.0));

    let overlap = a.intersection(&b);
    assert!(overlap.is_consistent());
    assert_eq!(overlap.min, DVec3::splat(2.0));
    assert_eq!(overlap.max, DVec3::splat(4.0));
}

#[test]
fn test_intersection_of_disjoint_boxes_is_inconsistent() {
    let a = make_aabb(DVec3::splat(0.0), DVec3::splat(1.0));
    let b = make_aabb(DVec3::splat(3.0), DVec3::splat(4.0));

    let empty = a.intersection(&b);
    assert!(!empty.is_consistent());
}

#[test]
fn test_union() {
    let a = make_aabb(DVec3::splat(-1.0), DVec3::splat(1.0));
    let b = make_aabb(DVec3::new(0.0, 5.0, -3.0), DVec3::new(2.0, 6.0, 0.0));

    let joined = a.union(&b);
    assert_eq!(joined.min, DVec3::new(-1.0, -1.0, -3.0));
    assert_eq!(joined.max, DVec3::new(2.0, 6.0, 1.0));
    assert!(joined.contains(&a));
    assert!(joined.contains(&b));
}

// ============================================================================
// Point operations
// ============================================================================

#[test]
fn test_enclose_point() {
    let mut aabb = make_aabb(DVec3::ZERO, DVec3::splat(1.0));
    aabb.enclose_point(DVec3::new(3.0, -2.0, 0.5));

    assert_eq!(aabb.min, DVec3::new(0.0, -2.0, 0.0));
    assert_eq!(aabb.max, DVec3::new(3.0, 1.0, 1.0));

    // Interior point changes nothing
    let before = aabb;
    aabb.enclose_point(DVec3::splat(0.5));
    assert_eq!(aabb, before);
}

#[test]
fn test_center_and_extent() {
    let aabb = make_aabb(DVec3::new(-2.0, 0.0, 4.0), DVec3::new(2.0, 6.0, 10.0));
    assert_eq!(aabb.center(), DVec3::new(0.0, 3.0, 7.0));
    assert_eq!(aabb.extent(), DVec3::new(4.0, 6.0, 6.0));
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_transformed_by_translation() {
    let aabb = make_aabb(DVec3::splat(-1.0), DVec3::splat(1.0));
    let matrix = DMat4::from_translation(DVec3::new(5.0, -3.0, 2.0));

    let moved = aabb.transformed(&matrix);
    assert_eq!(moved.min, DVec3::new(4.0, -4.0, 1.0));
    assert_eq!(moved.max, DVec3::new(6.0, -2.0, 3.0));
}

#[test]
fn test_transformed_matches_corner_fit_under_rotation() {
    // Tightness: the Arvo result equals the aabb fitted to the eight
    // transformed corners of the input box.
    let aabb = make_aabb(DVec3::new(1.0, 0.0, -2.0), DVec3::new(2.0, 1.0, 0.5));
    let matrix = DMat4::from_rotation_z(std::f64::consts::FRAC_PI_3)
        * DMat4::from_translation(DVec3::new(0.5, 2.0, -1.0));

    let transformed = aabb.transformed(&matrix);

    let mut expected: Option<Aabb> = None;
    for corner in 0..8 {
        let point = DVec3::new(
            if corner & 1 == 0 { aabb.min.x } else { aabb.max.x },
            if corner & 2 == 0 { aabb.min.y } else { aabb.max.y },
            if corner & 4 == 0 { aabb.min.z } else { aabb.max.z },
        );
        let moved = matrix.transform_point3(point);
        expected = Some(match expected {
            None => Aabb::new(moved, moved),
            Some(mut fit) => {
                fit.enclose_point(moved);
                fit
            }
        });
    }
    let expected = expected.unwrap();

    assert_vec_close(transformed.min, expected.min, 1e-12);
    assert_vec_close(transformed.max, expected.max, 1e-12);
}

#[test]
fn test_transformed_is_conservative_for_interior_points() {
    // Every transformed point of the box stays inside the transformed box.
    let aabb = make_aabb(DVec3::splat(-1.5), DVec3::splat(2.5));
    let matrix = DMat4::from_rotation_y(0.7) * DMat4::from_scale(DVec3::new(2.0, 0.5, 1.0));
    let transformed = aabb.transformed(&matrix);

    let samples = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(-1.5, 2.5, -1.5),
        DVec3::new(2.5, -1.5, 2.5),
        DVec3::new(1.0, 1.0, -0.5),
    ];
    for point in samples {
        let moved = matrix.transform_point3(point);
        let speck = Aabb::new(moved, moved);
        assert!(
            transformed.contains(&speck),
            "point {:?} escaped the transformed box",
            point
        );
    }
}

// ============================================================================
// Fit to vertices
// ============================================================================

#[test]
fn test_from_vertices_tight_fit() {
    let data = [
        0.0, 0.0, 0.0, //
        1.0, 2.0, -1.0, //
        -3.0, 0.5, 4.0, //
    ];
    let aabb = Aabb::from_vertices(&data, 0, 3, 3).unwrap();
    assert_eq!(aabb.min, DVec3::new(-3.0, 0.0, -1.0));
    assert_eq!(aabb.max, DVec3::new(1.0, 2.0, 4.0));
}

#[test]
fn test_from_vertices_with_offset_and_stride() {
    // Interleaved position + normal (stride 6), first vertex at offset 2
    let data = [
        9.0, 9.0, // header junk
        1.0, 1.0, 1.0, 0.0, 0.0, 0.0, //
        -1.0, 4.0, 2.0, 0.0, 0.0, 0.0, //
    ];
    let aabb = Aabb::from_vertices(&data, 2, 6, 2).unwrap();
    assert_eq!(aabb.min, DVec3::new(-1.0, 1.0, 1.0));
    assert_eq!(aabb.max, DVec3::new(1.0, 4.0, 2.0));
}

#[test]
fn test_from_vertices_rejects_bad_arguments() {
    let data = [0.0; 9];
    assert!(Aabb::from_vertices(&data, 0, 3, 0).is_err());
    assert!(Aabb::from_vertices(&data, 0, 2, 2).is_err());
    assert!(Aabb::from_vertices(&data, 0, 3, 4).is_err());
    assert!(Aabb::from_vertices(&data, 8, 3, 1).is_err());
}

#[test]
fn test_from_vertices_f32() {
    let data: [f32; 6] = [0.5, -1.0, 2.0, -0.5, 3.0, 1.0];
    let aabb = Aabb::from_vertices_f32(&data, 0, 3, 2).unwrap();
    assert_eq!(aabb.min, DVec3::new(-0.5, -1.0, 1.0));
    assert_eq!(aabb.max, DVec3::new(0.5, 3.0, 2.0));
}
