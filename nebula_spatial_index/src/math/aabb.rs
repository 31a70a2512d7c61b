/// Axis-aligned bounding box in ℝ³.
///
/// An `Aabb` is the ordered pair `(min, max)` with `min.k <= max.k` on each
/// axis. An *inconsistent* aabb (invariant violated) is legal only as the
/// transient result of an empty [`Aabb::intersection`]; every other
/// operation presupposes consistency.

use glam::{DMat4, DVec3};
use crate::error::{NebulaError, NebulaResult};

/// Axis-aligned bounding box with exposed corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: DVec3,
    /// Maximum corner (x, y, z)
    pub max: DVec3,
}

impl Aabb {
    /// Create an aabb from its two corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Fit an aabb to packed `f64` vertex data.
    ///
    /// Vertex `i` reads its (x, y, z) from
    /// `data[offset + i * stride .. offset + i * stride + 3]`.
    ///
    /// # Arguments
    ///
    /// * `data` - Packed scalar buffer
    /// * `offset` - Index of the first vertex's x coordinate
    /// * `stride` - Scalars between consecutive vertices (>= 3)
    /// * `count` - Number of vertices to visit (>= 1)
    pub fn from_vertices(
        data: &[f64],
        offset: usize,
        stride: usize,
        count: usize,
    ) -> NebulaResult<Self> {
        if count == 0 {
            return Err(NebulaError::InvalidVertexData(
                "vertex count is zero".to_string(),
            ));
        }
        if stride < 3 {
            return Err(NebulaError::InvalidVertexData(format!(
                "stride {} is below 3 scalars per vertex",
                stride
            )));
        }
        let last = offset + (count - 1) * stride + 3;
        if last > data.len() {
            return Err(NebulaError::InvalidVertexData(format!(
                "range [{}, {}) exceeds buffer of {} scalars",
                offset,
                last,
                data.len()
            )));
        }

        let first = DVec3::new(data[offset], data[offset + 1], data[offset + 2]);
        let mut aabb = Self::new(first, first);
        for i in 1..count {
            let base = offset + i * stride;
            aabb.enclose_point(DVec3::new(data[base], data[base + 1], data[base + 2]));
        }
        Ok(aabb)
    }

    /// Fit an aabb to packed `f32` vertex data (GPU-style buffers).
    ///
    /// Same layout rules as [`Aabb::from_vertices`].
    pub fn from_vertices_f32(
        data: &[f32],
        offset: usize,
        stride: usize,
        count: usize,
    ) -> NebulaResult<Self> {
        if count == 0 {
            return Err(NebulaError::InvalidVertexData(
                "vertex count is zero".to_string(),
            ));
        }
        if stride < 3 {
            return Err(NebulaError::InvalidVertexData(format!(
                "stride {} is below 3 scalars per vertex",
                stride
            )));
        }
        let last = offset + (count - 1) * stride + 3;
        if last > data.len() {
            return Err(NebulaError::InvalidVertexData(format!(
                "range [{}, {}) exceeds buffer of {} scalars",
                offset,
                last,
                data.len()
            )));
        }

        let read = |base: usize| {
            DVec3::new(
                f64::from(data[base]),
                f64::from(data[base + 1]),
                f64::from(data[base + 2]),
            )
        };
        let first = read(offset);
        let mut aabb = Self::new(first, first);
        for i in 1..count {
            aabb.enclose_point(read(offset + i * stride));
        }
        Ok(aabb)
    }

    /// Whether `min.k <= max.k` holds on every axis.
    ///
    /// False for the transient result of an empty intersection.
    pub fn is_consistent(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Center point of this aabb.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of this aabb.
    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    /// Test if this aabb fully contains another aabb.
    ///
    /// Returns `true` if `other` is entirely within `self` (closed bounds).
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this aabb intersects (overlaps) another aabb.
    ///
    /// Returns `true` if the two aabbs overlap or touch.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Intersection of two aabbs.
    ///
    /// When the boxes are disjoint the result is inconsistent
    /// (some `min.k > max.k`); check [`Aabb::is_consistent`] before use.
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Smallest aabb enclosing both inputs.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow this aabb to include a point.
    pub fn enclose_point(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Transform this aabb by a matrix, returning the enclosing aabb.
    ///
    /// Uses the Arvo method: seeds both corners with the translation column,
    /// then accumulates the per-axis min/max of each matrix column scaled by
    /// the source corners. Tight for affine matrices; conservative (not
    /// tight) for non-affine input.
    pub fn transformed(&self, matrix: &DMat4) -> Aabb {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        Aabb { min: new_min, max: new_max }
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
