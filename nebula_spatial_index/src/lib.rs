/*!
# Nebula Spatial Index

3D spatial indexing for axis-aligned bounded entities.

This crate organizes a dynamic set of labeled bounding boxes in ℝ³ and
answers three standing queries — box overlap, view-volume (frustum)
visibility, and all-pairs intersection — through a common [`SpatialIndex`]
contract with three implementations:

- **[`LinearIndex`]**: flat-array reference implementation, used as a
  ground-truth oracle in differential tests.
- **[`HierarchicalOctree`]**: pointer-style dynamic octree (arena-backed),
  with an unbounded root that grows to cover new items.
- **[`GridOctree`]**: packed grid-backed complete octree — the
  performance-critical variant, tuned for cache-coherent bulk insertion and
  frustum traversal with early rejection.

The supporting geometric primitives live in [`math`]: [`Aabb`], [`Frustum`],
[`PlaneState`], and the plane utilities.

All geometry is double precision (`glam` `DVec3`/`DVec4`/`DMat4`).
*/

// Error handling module
pub mod error;

// Internal logging system
pub mod log;

// Geometric primitives
pub mod math;

// Spatial index implementations
pub mod index;

// Re-export error types at crate root
pub use error::{NebulaError, NebulaResult};

// Re-export the primitives and indices
pub use math::{
    Aabb, BoundVolume, Frustum, FrustumTest, PlaneState, Sphere,
    PLANE_NEAR, PLANE_FAR, PLANE_TOP, PLANE_BOTTOM, PLANE_LEFT, PLANE_RIGHT,
};
pub use index::{
    BoundedSpatialIndex, GridOctree, HierarchicalOctree, ItemKey, LinearIndex,
    SpatialIndex,
};

// Re-export math library
pub use glam;
