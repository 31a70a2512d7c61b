/// LinearIndex — flat-array reference implementation.
///
/// Two packed parallel arrays (items and 6-scalar aabbs) plus a logical
/// size. Every query is a linear scan; removal swaps with the tail. No
/// spatial extent constraint: `add` always succeeds.
///
/// This is the ground-truth oracle the optimized indices are tested
/// against; it is also perfectly adequate for small scenes.

use glam::DVec3;
use crate::math::{Aabb, Frustum, FrustumTest, PLANE_NEAR};
use super::spatial_index::SpatialIndex;

/// Flat-array spatial index.
pub struct LinearIndex<T> {
    elements: Vec<Option<T>>,
    /// 6 scalars per entry: min x/y/z, max x/y/z
    aabbs: Vec<f64>,
    /// Last frustum plane that rejected each entry, tested first next time
    hints: Vec<usize>,
    size: usize,
}

fn read_aabb(aabbs: &[f64], slot: usize) -> Aabb {
    let base = slot * 6;
    Aabb::new(
        DVec3::new(aabbs[base], aabbs[base + 1], aabbs[base + 2]),
        DVec3::new(aabbs[base + 3], aabbs[base + 4], aabbs[base + 5]),
    )
}

fn write_aabb(aabbs: &mut [f64], slot: usize, aabb: &Aabb) {
    let base = slot * 6;
    aabbs[base] = aabb.min.x;
    aabbs[base + 1] = aabb.min.y;
    aabbs[base + 2] = aabb.min.z;
    aabbs[base + 3] = aabb.max.x;
    aabbs[base + 4] = aabb.max.y;
    aabbs[base + 5] = aabb.max.z;
}

impl<T: PartialEq> LinearIndex<T> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            aabbs: Vec::new(),
            hints: Vec::new(),
            size: 0,
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn find(&self, item: &T) -> Option<usize> {
        (0..self.size).find(|&i| self.elements[i].as_ref() == Some(item))
    }
}

impl<T: PartialEq> Default for LinearIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> SpatialIndex<T> for LinearIndex<T> {
    fn add(&mut self, item: T, bounds: &Aabb) -> bool {
        let slot = self.size;
        if slot == self.elements.len() {
            self.elements.push(Some(item));
            self.aabbs.extend_from_slice(&[0.0; 6]);
            self.hints.push(PLANE_NEAR);
        } else {
            self.elements[slot] = Some(item);
            self.hints[slot] = PLANE_NEAR;
        }
        write_aabb(&mut self.aabbs, slot, bounds);
        self.size += 1;
        true
    }

    fn remove(&mut self, item: &T) -> bool {
        let Some(slot) = self.find(item) else {
            return false;
        };
        let tail = self.size - 1;
        if slot != tail {
            self.elements.swap(slot, tail);
            let moved = read_aabb(&self.aabbs, tail);
            write_aabb(&mut self.aabbs, slot, &moved);
            self.hints[slot] = self.hints[tail];
        }
        self.elements[tail] = None;
        self.size -= 1;
        true
    }

    fn clear(&mut self, fast: bool) {
        if !fast {
            for element in &mut self.elements {
                *element = None;
            }
        }
        self.size = 0;
    }

    fn query_volume(&mut self, volume: &Aabb, cb: &mut dyn FnMut(&T, &Aabb)) {
        for i in 0..self.size {
            let bounds = read_aabb(&self.aabbs, i);
            if volume.intersects(&bounds) {
                if let Some(item) = self.elements[i].as_ref() {
                    cb(item, &bounds);
                }
            }
        }
    }

    fn query_frustum(&mut self, frustum: &Frustum, cb: &mut dyn FnMut(&T, &Aabb)) {
        for i in 0..self.size {
            let bounds = read_aabb(&self.aabbs, i);
            let mut hint = self.hints[i];
            let result = frustum.intersects_hinted(&bounds, None, &mut hint);
            self.hints[i] = hint;
            if result != FrustumTest::Outside {
                if let Some(item) = self.elements[i].as_ref() {
                    cb(item, &bounds);
                }
            }
        }
    }

    fn query_pairs(&mut self, cb: &mut dyn FnMut(&T, &Aabb, &T, &Aabb)) {
        for i in 0..self.size {
            let bounds_i = read_aabb(&self.aabbs, i);
            for j in (i + 1)..self.size {
                let bounds_j = read_aabb(&self.aabbs, j);
                if !bounds_i.intersects(&bounds_j) {
                    continue;
                }
                if let (Some(a), Some(b)) =
                    (self.elements[i].as_ref(), self.elements[j].as_ref())
                {
                    cb(a, &bounds_i, b, &bounds_j);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "linear_index_tests.rs"]
mod tests;
