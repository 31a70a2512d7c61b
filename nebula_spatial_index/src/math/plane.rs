/// Plane utilities over raw 4-coefficient vectors.
///
/// A plane is stored as a `DVec4` `(a, b, c, d)` describing
/// `a·x + b·y + c·z + d = 0`, with `(a, b, c)` the normal. The frustum
/// keeps its six planes in this form; these helpers operate on them
/// without a wrapper type.

use glam::{DVec3, DVec4};

/// Normalize a plane so its normal has unit length.
///
/// All four coefficients are divided by the length of `(a, b, c)`.
pub fn normalize(plane: DVec4) -> DVec4 {
    let normal_len = plane.truncate().length();
    if normal_len > 0.0 {
        plane / normal_len
    } else {
        plane
    }
}

/// Signed distance from a point to a plane.
///
/// Positive on the side the normal points to. When `assume_normalized`
/// is false the raw result is divided by the normal's length.
pub fn signed_distance(plane: DVec4, point: DVec3, assume_normalized: bool) -> f64 {
    let raw = plane.truncate().dot(point) + plane.w;
    if assume_normalized {
        raw
    } else {
        let normal_len = plane.truncate().length();
        if normal_len > 0.0 { raw / normal_len } else { raw }
    }
}

/// Orthonormal tangent basis for a plane normal.
///
/// Returns `(tangent, bitangent)` so that `(tangent, bitangent, normal)`
/// is right-handed. The seed axis is chosen least aligned with the normal
/// to keep the cross products well conditioned.
pub fn tangent_space(normal: DVec3) -> (DVec3, DVec3) {
    let n = normal.normalize();
    let seed = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        DVec3::X
    } else if n.y.abs() <= n.z.abs() {
        DVec3::Y
    } else {
        DVec3::Z
    };
    let tangent = seed.cross(n).normalize();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

#[cfg(test)]
#[path = "plane_tests.rs"]
mod tests;
