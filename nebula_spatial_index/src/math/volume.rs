/// Bound volume sum type — aabb or sphere behind one surface.
///
/// The indices themselves store aabbs only; `BoundVolume` is a
/// convenience for callers that track spherical bounds and convert at
/// insertion time via [`BoundVolume::aabb`].

use glam::{DMat4, DVec3};
use super::aabb::Aabb;
use super::frustum::{Frustum, FrustumTest};
use super::plane;

/// Bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center point
    pub center: DVec3,
    /// Radius (non-negative)
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere from center and radius.
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Test if this sphere overlaps another sphere.
    pub fn intersects_sphere(&self, other: &Sphere) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) <= r * r
    }

    /// Test if this sphere overlaps an aabb.
    ///
    /// Distance from the center to the closest point of the box.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let closest = self.center.clamp(aabb.min, aabb.max);
        self.center.distance_squared(closest) <= self.radius * self.radius
    }

    /// Smallest aabb enclosing this sphere.
    pub fn aabb(&self) -> Aabb {
        let r = DVec3::splat(self.radius);
        Aabb::new(self.center - r, self.center + r)
    }

    /// Transform this sphere by a matrix.
    ///
    /// The center is transformed as a point; the radius is scaled by the
    /// largest column length, so the result encloses the transformed
    /// sphere under anisotropic scale.
    pub fn transformed(&self, matrix: &DMat4) -> Sphere {
        let center = matrix.transform_point3(self.center);
        let scale = matrix
            .col(0)
            .truncate()
            .length()
            .max(matrix.col(1).truncate().length())
            .max(matrix.col(2).truncate().length());
        Sphere::new(center, self.radius * scale)
    }

    /// Grow this sphere to include a point.
    pub fn enclose_point(&mut self, point: DVec3) {
        let dist = self.center.distance(point);
        if dist > self.radius {
            self.radius = dist;
        }
    }

    /// Classify this sphere against a frustum.
    pub fn test_frustum(&self, frustum: &Frustum) -> FrustumTest {
        let mut result = FrustumTest::Inside;
        for k in 0..6 {
            let dist = plane::signed_distance(frustum.plane(k), self.center, true);
            if dist < -self.radius {
                return FrustumTest::Outside;
            }
            if dist < self.radius {
                result = FrustumTest::Intersect;
            }
        }
        result
    }
}

/// Either bound volume shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundVolume {
    /// Axis-aligned box
    Aabb(Aabb),
    /// Sphere
    Sphere(Sphere),
}

impl BoundVolume {
    /// Enclosing aabb of this volume — the form the indices store.
    pub fn aabb(&self) -> Aabb {
        match self {
            BoundVolume::Aabb(aabb) => *aabb,
            BoundVolume::Sphere(sphere) => sphere.aabb(),
        }
    }

    /// Test if two bound volumes overlap.
    pub fn intersects(&self, other: &BoundVolume) -> bool {
        match (self, other) {
            (BoundVolume::Aabb(a), BoundVolume::Aabb(b)) => a.intersects(b),
            (BoundVolume::Sphere(a), BoundVolume::Sphere(b)) => a.intersects_sphere(b),
            (BoundVolume::Sphere(s), BoundVolume::Aabb(b))
            | (BoundVolume::Aabb(b), BoundVolume::Sphere(s)) => s.intersects_aabb(b),
        }
    }

    /// Transform this volume by a matrix, keeping its shape kind.
    pub fn transformed(&self, matrix: &DMat4) -> BoundVolume {
        match self {
            BoundVolume::Aabb(aabb) => BoundVolume::Aabb(aabb.transformed(matrix)),
            BoundVolume::Sphere(sphere) => BoundVolume::Sphere(sphere.transformed(matrix)),
        }
    }

    /// Grow this volume to include a point.
    pub fn enclose_point(&mut self, point: DVec3) {
        match self {
            BoundVolume::Aabb(aabb) => aabb.enclose_point(point),
            BoundVolume::Sphere(sphere) => sphere.enclose_point(point),
        }
    }

    /// Classify this volume against a frustum.
    pub fn test_frustum(&self, frustum: &Frustum) -> FrustumTest {
        match self {
            BoundVolume::Aabb(aabb) => frustum.intersects(aabb, None),
            BoundVolume::Sphere(sphere) => sphere.test_frustum(frustum),
        }
    }
}

#[cfg(test)]
#[path = "volume_tests.rs"]
mod tests;
