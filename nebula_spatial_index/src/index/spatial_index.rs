/// Spatial index contract.
///
/// A SpatialIndex organizes `(item, aabb)` pairs for efficient overlap,
/// frustum-visibility, and all-pairs queries. The caller creates and owns
/// the index; implementations include the flat [`LinearIndex`] oracle, the
/// pointer-style [`HierarchicalOctree`], and the packed [`GridOctree`].
///
/// [`LinearIndex`]: super::LinearIndex
/// [`HierarchicalOctree`]: super::HierarchicalOctree
/// [`GridOctree`]: super::GridOctree

use crate::error::NebulaResult;
use crate::math::{Aabb, Frustum};

/// Trait for spatial indexing of labeled bounding boxes.
///
/// Items are compared by `PartialEq` on the caller's handle type; the
/// stored aabb is a copy, so later mutation of the caller's box does not
/// affect the index.
///
/// Queries take `&mut self`: implementations keep per-item query-id
/// stamps and deferred maintenance that run at query entry, and the
/// exclusive receiver statically rules out mutating the index from
/// inside a callback. The `Aabb` handed to a callback is scratch owned
/// by the index — copy it to retain it past the callback.
pub trait SpatialIndex<T> {
    /// Insert an item with its world-space aabb.
    ///
    /// Returns `false` (and indexes nothing) if the aabb does not fit the
    /// index extent; unbounded implementations always return `true`.
    fn add(&mut self, item: T, bounds: &Aabb) -> bool;

    /// Remove an item from the index.
    ///
    /// Returns `false` if the item is not present.
    fn remove(&mut self, item: &T) -> bool;

    /// Remove all items.
    ///
    /// `fast = true` resets bookkeeping but keeps item slots and interior
    /// allocations in place for reuse; `fast = false` additionally drops
    /// all stored items. Both leave the index query-empty.
    fn clear(&mut self, fast: bool);

    /// Invoke `cb` for every item whose aabb intersects `volume`.
    fn query_volume(&mut self, volume: &Aabb, cb: &mut dyn FnMut(&T, &Aabb));

    /// Invoke `cb` for every item whose aabb intersects the frustum.
    fn query_frustum(&mut self, frustum: &Frustum, cb: &mut dyn FnMut(&T, &Aabb));

    /// Invoke `cb` exactly once for every unordered pair of intersecting
    /// items. The ordering of the two items within a pair is
    /// implementation-defined.
    fn query_pairs(&mut self, cb: &mut dyn FnMut(&T, &Aabb, &T, &Aabb));
}

/// A spatial index restricted to a fixed axis-aligned extent.
///
/// Items whose aabbs are not contained in the extent are rejected by
/// `add` with a `false` return.
pub trait BoundedSpatialIndex<T>: SpatialIndex<T> {
    /// The total axis-aligned volume this index covers.
    fn extent(&self) -> &Aabb;

    /// Replace the extent.
    ///
    /// Legal only while the index is empty; fails with
    /// [`NebulaError::IndexNotEmpty`] otherwise.
    ///
    /// [`NebulaError::IndexNotEmpty`]: crate::error::NebulaError::IndexNotEmpty
    fn set_extent(&mut self, extent: Aabb) -> NebulaResult<()>;
}
