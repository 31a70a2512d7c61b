/// Frustum — six-plane convex view volume for visibility queries.
///
/// A frustum is defined by a local basis `(location, direction, up)` and
/// six edge parameters `(left, right, bottom, top, near, far)` plus an
/// orthographic flag. `update()` derives the view matrix, the projection
/// matrix, and the six world-space clipping planes.
///
/// Each plane is a `DVec4` `(a, b, c, d)` where `(a, b, c)` is the
/// inward-pointing unit normal; a point P is inside plane k iff
/// `a·P.x + b·P.y + c·P.z + d >= 0`.

use glam::{DMat4, DVec3, DVec4};
use crate::error::{NebulaError, NebulaResult};
use super::aabb::Aabb;
use super::plane;
use super::plane_state::PlaneState;

/// Frustum plane indices
pub const PLANE_NEAR: usize = 0;
pub const PLANE_FAR: usize = 1;
pub const PLANE_TOP: usize = 2;
pub const PLANE_BOTTOM: usize = 3;
pub const PLANE_LEFT: usize = 4;
pub const PLANE_RIGHT: usize = 5;

/// Three-way result of a frustum/aabb classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// The box is entirely inside the frustum
    Inside,
    /// The box is entirely outside at least one plane
    Outside,
    /// The box straddles at least one plane
    Intersect,
}

/// Six-plane convex view volume with its view/projection matrices.
///
/// Works with both perspective and orthographic projections. The planes
/// are normalized and orient their normals inward.
#[derive(Debug, Clone)]
pub struct Frustum {
    location: DVec3,
    direction: DVec3,
    up: DVec3,

    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    near: f64,
    far: f64,
    ortho: bool,

    view: DMat4,
    projection: DMat4,
    planes: [DVec4; 6],
}

impl Frustum {
    /// Create a perspective frustum from field of view and aspect ratio.
    ///
    /// # Arguments
    ///
    /// * `fov_deg` - Vertical field of view in degrees, in (0, 180]
    /// * `aspect` - Width over height, strictly positive
    /// * `near` - Near plane distance, strictly positive
    /// * `far` - Far plane distance, `near <= far`
    ///
    /// The basis defaults to the origin looking down −Z with +Y up;
    /// use [`Frustum::set_orientation`] to move it.
    pub fn perspective(fov_deg: f64, aspect: f64, near: f64, far: f64) -> NebulaResult<Self> {
        if !(fov_deg > 0.0 && fov_deg <= 180.0) {
            return Err(NebulaError::InvalidFieldOfView(fov_deg));
        }
        if !(aspect > 0.0) {
            return Err(NebulaError::InvalidAspectRatio(aspect));
        }
        if !(near > 0.0) {
            return Err(NebulaError::InvalidNearPlane(near));
        }
        let half_height = (fov_deg.to_radians() * 0.5).tan() * near;
        let half_width = half_height * aspect;
        Self::new(false, -half_width, half_width, -half_height, half_height, near, far)
    }

    /// Create a frustum from its six raw edges.
    ///
    /// `ortho = true` builds an orthographic volume (a box); otherwise the
    /// edges describe the near rectangle of a perspective volume and `near`
    /// must be strictly positive.
    pub fn new(
        ortho: bool,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> NebulaResult<Self> {
        Self::validate_edges(ortho, left, right, bottom, top, near, far)?;
        let mut frustum = Self {
            location: DVec3::ZERO,
            direction: DVec3::NEG_Z,
            up: DVec3::Y,
            left,
            right,
            bottom,
            top,
            near,
            far,
            ortho,
            view: DMat4::IDENTITY,
            projection: DMat4::IDENTITY,
            planes: [DVec4::ZERO; 6],
        };
        frustum.update();
        Ok(frustum)
    }

    fn validate_edges(
        ortho: bool,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> NebulaResult<()> {
        if left > right {
            return Err(NebulaError::InvalidFrustumEdges(format!(
                "left ({}) > right ({})",
                left, right
            )));
        }
        if bottom > top {
            return Err(NebulaError::InvalidFrustumEdges(format!(
                "bottom ({}) > top ({})",
                bottom, top
            )));
        }
        if near > far {
            return Err(NebulaError::InvalidFrustumEdges(format!(
                "near ({}) > far ({})",
                near, far
            )));
        }
        if !ortho && near <= 0.0 {
            return Err(NebulaError::InvalidNearPlane(near));
        }
        Ok(())
    }

    // ===== RECONFIGURATION =====

    /// Replace the perspective parameters; recomputes derived state.
    pub fn set_perspective(
        &mut self,
        fov_deg: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> NebulaResult<()> {
        if !(fov_deg > 0.0 && fov_deg <= 180.0) {
            return Err(NebulaError::InvalidFieldOfView(fov_deg));
        }
        if !(aspect > 0.0) {
            return Err(NebulaError::InvalidAspectRatio(aspect));
        }
        if !(near > 0.0) {
            return Err(NebulaError::InvalidNearPlane(near));
        }
        let half_height = (fov_deg.to_radians() * 0.5).tan() * near;
        let half_width = half_height * aspect;
        self.set_frustum(false, -half_width, half_width, -half_height, half_height, near, far)
    }

    /// Replace the six raw edges; recomputes derived state.
    pub fn set_frustum(
        &mut self,
        ortho: bool,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> NebulaResult<()> {
        Self::validate_edges(ortho, left, right, bottom, top, near, far)?;
        self.left = left;
        self.right = right;
        self.bottom = bottom;
        self.top = top;
        self.near = near;
        self.far = far;
        self.ortho = ortho;
        self.update();
        Ok(())
    }

    /// Move and aim the frustum; recomputes derived state.
    ///
    /// `direction` and `up` need not be unit length but must be nonzero
    /// and non-parallel.
    pub fn set_orientation(&mut self, location: DVec3, direction: DVec3, up: DVec3) {
        self.location = location;
        self.direction = direction;
        self.up = up;
        self.update();
    }

    /// Recompute the derived state after a parameter change.
    ///
    /// Order: the orthonormal basis `(u = up×n, v = n×u, n = −direction)`
    /// — realized by `look_to_rh` —, then the projection matrix, the view
    /// matrix, and finally the six world-space planes.
    fn update(&mut self) {
        self.view = DMat4::look_to_rh(self.location, self.direction, self.up);
        self.projection = if self.ortho {
            Self::orthographic_matrix(
                self.left, self.right, self.bottom, self.top, self.near, self.far,
            )
        } else {
            Self::perspective_matrix(
                self.left, self.right, self.bottom, self.top, self.near, self.far,
            )
        };
        self.extract_planes();
    }

    /// Off-center perspective projection, GL convention (z in [-1, 1]).
    ///
    /// ```text
    /// | 2n/(r-l)    0      (r+l)/(r-l)      0      |
    /// |    0     2n/(t-b)  (t+b)/(t-b)      0      |
    /// |    0        0     -(f+n)/(f-n)  -2fn/(f-n) |
    /// |    0        0          -1           0      |
    /// ```
    fn perspective_matrix(l: f64, r: f64, b: f64, t: f64, n: f64, f: f64) -> DMat4 {
        DMat4::from_cols(
            DVec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
            DVec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
            DVec4::new(
                (r + l) / (r - l),
                (t + b) / (t - b),
                -(f + n) / (f - n),
                -1.0,
            ),
            DVec4::new(0.0, 0.0, -2.0 * f * n / (f - n), 0.0),
        )
    }

    /// Orthographic projection, GL convention (z in [-1, 1]).
    ///
    /// ```text
    /// | 2/(r-l)    0        0      -(r+l)/(r-l) |
    /// |    0    2/(t-b)     0      -(t+b)/(t-b) |
    /// |    0       0     -2/(f-n)  -(f+n)/(f-n) |
    /// |    0       0        0           1       |
    /// ```
    fn orthographic_matrix(l: f64, r: f64, b: f64, t: f64, n: f64, f: f64) -> DMat4 {
        DMat4::from_cols(
            DVec4::new(2.0 / (r - l), 0.0, 0.0, 0.0),
            DVec4::new(0.0, 2.0 / (t - b), 0.0, 0.0),
            DVec4::new(0.0, 0.0, -2.0 / (f - n), 0.0),
            DVec4::new(
                -(r + l) / (r - l),
                -(t + b) / (t - b),
                -(f + n) / (f - n),
                1.0,
            ),
        )
    }

    /// Extract the six world-space planes from the view-projection matrix.
    ///
    /// Gribb & Hartmann: each clipping plane is a sum or difference of the
    /// fourth row of `projection × view` with one of the other rows. The
    /// result is normalized with inward normals.
    fn extract_planes(&mut self) {
        let m = (self.projection * self.view).to_cols_array_2d();
        let row = |r: usize| DVec4::new(m[0][r], m[1][r], m[2][r], m[3][r]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        self.planes[PLANE_NEAR] = plane::normalize(r3 + r2);
        self.planes[PLANE_FAR] = plane::normalize(r3 - r2);
        self.planes[PLANE_TOP] = plane::normalize(r3 - r1);
        self.planes[PLANE_BOTTOM] = plane::normalize(r3 + r1);
        self.planes[PLANE_LEFT] = plane::normalize(r3 + r0);
        self.planes[PLANE_RIGHT] = plane::normalize(r3 - r0);
    }

    // ===== GETTERS =====

    /// Eye location.
    pub fn location(&self) -> DVec3 {
        self.location
    }

    /// View direction (as supplied, not normalized).
    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Up hint (as supplied, not normalized).
    pub fn up(&self) -> DVec3 {
        self.up
    }

    /// Whether this is an orthographic volume.
    pub fn is_ortho(&self) -> bool {
        self.ortho
    }

    /// View matrix (world to eye space).
    pub fn view_matrix(&self) -> &DMat4 {
        &self.view
    }

    /// Projection matrix (eye to clip space).
    pub fn projection_matrix(&self) -> &DMat4 {
        &self.projection
    }

    /// World-space plane `k` (see the `PLANE_*` constants).
    pub fn plane(&self, index: usize) -> DVec4 {
        self.planes[index]
    }

    // ===== AABB CLASSIFICATION =====

    /// Classify an aabb against the frustum.
    ///
    /// For each plane whose `PlaneState` bit is clear, the box's *positive
    /// extent* (corner farthest along the plane normal) and *negative
    /// extent* (farthest against it) are tested:
    /// - positive extent behind the plane ⇒ `Outside`, immediately;
    /// - negative extent behind the plane ⇒ the box straddles, result
    ///   downgrades to `Intersect`;
    /// - otherwise the box is wholly inside plane k and its bit is set in
    ///   `state`, so descendants skip it.
    ///
    /// Fast exit: when `state` reports no tests required the result is
    /// `Inside` without touching any plane.
    pub fn intersects(&self, aabb: &Aabb, state: Option<&mut PlaneState>) -> FrustumTest {
        let mut ignored = PLANE_NEAR;
        self.classify(aabb, state, &mut ignored)
    }

    /// Classify an aabb, testing the hinted plane first.
    ///
    /// `hint` holds the plane index that last produced `Outside` for this
    /// box; testing it first collapses coherent query streams to one or two
    /// plane tests. On an `Outside` result the hint is updated.
    pub fn intersects_hinted(
        &self,
        aabb: &Aabb,
        state: Option<&mut PlaneState>,
        hint: &mut usize,
    ) -> FrustumTest {
        self.classify(aabb, state, hint)
    }

    fn classify(
        &self,
        aabb: &Aabb,
        mut state: Option<&mut PlaneState>,
        hint: &mut usize,
    ) -> FrustumTest {
        if let Some(s) = state.as_deref() {
            if !s.tests_required() {
                return FrustumTest::Inside;
            }
        }

        let first = (*hint).min(5);
        let mut result = FrustumTest::Inside;

        for k in std::iter::once(first).chain((0..6).filter(|&p| p != first)) {
            if let Some(s) = state.as_deref() {
                if s.is_culled(k) {
                    continue;
                }
            }

            let p = self.planes[k];
            let positive = DVec3::new(
                if p.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if p.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if p.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane::signed_distance(p, positive, true) < 0.0 {
                *hint = k;
                return FrustumTest::Outside;
            }

            let negative = DVec3::new(
                if p.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if p.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if p.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if plane::signed_distance(p, negative, true) < 0.0 {
                result = FrustumTest::Intersect;
            } else if let Some(s) = state.as_deref_mut() {
                // Box wholly inside plane k: descendants skip it.
                s.mark_culled(k);
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
