//! Spatial index implementations.
//!
//! One contract, three data structures: a flat-array reference
//! implementation, a pointer-style dynamic octree, and the packed
//! grid-backed complete octree.

mod spatial_index;
mod linear_index;
mod hierarchical_octree;
mod grid_octree;

pub use spatial_index::{BoundedSpatialIndex, SpatialIndex};
pub use linear_index::LinearIndex;
pub use hierarchical_octree::{HierarchicalOctree, ItemKey};
pub use grid_octree::GridOctree;
