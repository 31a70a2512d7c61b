/// GridOctree — packed grid-backed complete octree.
///
/// A fully-allocated octree counting structure layered on top of a flat
/// leaf grid. For a tree of `depth` levels the leaf level is an `N³`
/// uniform grid with `N = 2^(depth−1)`; a flat `counts` array of length
/// `(8^depth − 1)/7` packs every level, with level L starting at offset
/// `(8^L − 1)/7` and a child addressed as `(parent_in_level << 3) | octant`.
/// Internal entries hold occupancy counts (a conservative non-zero test
/// that lets traversal skip empty subtrees); leaf entries hold the hash
/// index of the lazily-allocated cell, or −1 when none exists.
///
/// Item payloads live in packed parallel arrays (handles, 6-scalar aabbs,
/// query-id stamps) grown by ×1.5 doubling. Cells store item slot indices
/// and are retained across clears until empty for more than
/// [`CELL_RETENTION`] clears.
///
/// Counts are occupancy *sums*: an item covering M cells contributes M to
/// the root. Only zero/non-zero is ever interpreted.

use glam::DVec3;
use crate::error::{NebulaError, NebulaResult};
use crate::math::{Aabb, Frustum, FrustumTest, PlaneState};
use crate::{nebula_debug, nebula_error, nebula_trace};
use super::spatial_index::{BoundedSpatialIndex, SpatialIndex};

/// Clears a cell may sit empty before its storage is released.
const CELL_RETENTION: u32 = 15;

/// Initial capacity of the packed item arrays.
const INITIAL_CAPACITY: usize = 8;

/// Leaf-level bucket: slot indices of every item whose aabb covers the
/// cell, plus the number of clears survived since last insertion.
struct Cell {
    keys: Vec<usize>,
    lifetime: u32,
}

impl Cell {
    fn new() -> Self {
        Self {
            keys: Vec::new(),
            lifetime: 0,
        }
    }
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

/// Halve `bounds` in place onto the given child octant.
///
/// Must be paired with exactly one [`step_out_to_parent`] with the same
/// octant; the calls may not nest out of order.
fn step_into_child(bounds: &mut Aabb, octant: usize) {
    for k in 0..3 {
        let mid = (bounds.min[k] + bounds.max[k]) * 0.5;
        if octant & (1 << k) != 0 {
            bounds.min[k] = mid;
        } else {
            bounds.max[k] = mid;
        }
    }
}

/// Undo [`step_into_child`] by reflecting the halved edge back out.
fn step_out_to_parent(bounds: &mut Aabb, octant: usize) {
    for k in 0..3 {
        if octant & (1 << k) != 0 {
            bounds.min[k] = 2.0 * bounds.min[k] - bounds.max[k];
        } else {
            bounds.max[k] = 2.0 * bounds.max[k] - bounds.min[k];
        }
    }
}

/// Packed grid-octree spatial index over a fixed extent.
pub struct GridOctree<T> {
    extent: Aabb,
    /// Number of tree levels, >= 1
    depth: usize,
    /// Leaves per axis: 2^(depth-1)
    grid_dim: usize,
    /// Offset of each level in `counts`: (8^L - 1)/7
    level_offsets: Vec<usize>,
    /// Packed per-node occupancy; leaf level holds cell index or -1
    counts: Vec<i32>,
    /// Leaf grid, indexed by spatial hash
    cells: Vec<Option<Cell>>,

    elements: Vec<Option<T>>,
    /// 6 scalars per item: min x/y/z, max x/y/z
    aabbs: Vec<f64>,
    /// Last query id that visited each item
    query_ids: Vec<u64>,
    size: usize,
    query_id_counter: u64,

    /// Hash factors: cell = floor((p + offset) * scale), clamped
    scale: DVec3,
    offset: DVec3,
}

impl<T: PartialEq> GridOctree<T> {
    /// Create a grid-octree covering `extent` with `depth` tree levels.
    ///
    /// Depth 6 gives a 32³ leaf grid. Fails on an inconsistent or
    /// zero-volume extent and on depths outside `1..=10`.
    pub fn new(extent: Aabb, depth: u32) -> NebulaResult<Self> {
        if depth == 0 || depth > 10 {
            return Err(Self::log_err(NebulaError::InvalidDepth(depth)));
        }
        if !extent.is_consistent() {
            return Err(Self::log_err(NebulaError::InvalidExtent(format!(
                "min {:?} exceeds max {:?}",
                extent.min, extent.max
            ))));
        }
        let size = extent.extent();
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err(Self::log_err(NebulaError::InvalidExtent(format!(
                "zero-volume extent {:?}..{:?}",
                extent.min, extent.max
            ))));
        }
        let octree = Self::build(extent, depth as usize);
        nebula_debug!(
            "nebula::GridOctree",
            "created depth {} ({}^3 leaf cells) over {:?}..{:?}",
            depth,
            octree.grid_dim,
            extent.min,
            extent.max
        );
        Ok(octree)
    }

    /// Create a grid-octree for a scene of roughly `object_size` objects
    /// inside a cube of edge `side_length` centered at the origin.
    ///
    /// The depth is `ceil(log2(side_length / object_size))` so leaf cells
    /// match the expected object size.
    pub fn with_object_size(side_length: f64, object_size: f64) -> NebulaResult<Self> {
        if !(side_length > 0.0) || !(object_size > 0.0) || object_size > side_length {
            return Err(Self::log_err(NebulaError::InvalidExtent(format!(
                "side length {} incompatible with object size {}",
                side_length, object_size
            ))));
        }
        let depth = (side_length / object_size).log2().ceil().max(1.0) as u32;
        let half = DVec3::splat(side_length * 0.5);
        Self::new(Aabb::new(-half, half), depth)
    }

    /// Assemble the packed arrays; callers have validated the arguments.
    fn build(extent: Aabb, depth: usize) -> Self {
        let grid_dim = 1usize << (depth - 1);

        // level_offsets[L] = (8^L - 1)/7; one extra entry for the total
        let mut level_offsets = Vec::with_capacity(depth + 1);
        let mut offset = 0usize;
        let mut level_len = 1usize;
        for _ in 0..=depth {
            level_offsets.push(offset);
            offset += level_len;
            level_len *= 8;
        }
        let total_nodes = level_offsets[depth];

        let mut counts = vec![0i32; total_nodes];
        // Leaf level holds cell references, not counts
        for leaf in &mut counts[level_offsets[depth - 1]..] {
            *leaf = -1;
        }

        let cell_count = grid_dim * grid_dim * grid_dim;
        let mut cells = Vec::with_capacity(cell_count);
        cells.resize_with(cell_count, || None);

        let size = extent.extent();
        let scale = DVec3::splat(grid_dim as f64) / size;

        let mut elements = Vec::with_capacity(INITIAL_CAPACITY);
        elements.resize_with(INITIAL_CAPACITY, || None);

        Self {
            extent,
            depth,
            grid_dim,
            level_offsets,
            counts,
            cells,
            elements,
            aabbs: vec![0.0; INITIAL_CAPACITY * 6],
            query_ids: vec![0; INITIAL_CAPACITY],
            size: 0,
            query_id_counter: 0,
            scale,
            offset: -extent.min,
        }
    }

    fn log_err(error: NebulaError) -> NebulaError {
        nebula_error!("nebula::GridOctree", "{}", error);
        error
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Tree depth in levels.
    pub fn depth(&self) -> u32 {
        self.depth as u32
    }

    // ===== SPATIAL HASH =====

    /// Cell coordinate of a scalar along one axis, clamped to the grid.
    ///
    /// Clamping on every hash keeps a max corner exactly on the far edge
    /// inside the last cell instead of one past it.
    fn cell_coord(&self, value: f64, axis: usize) -> usize {
        let raw = ((value + self.offset[axis]) * self.scale[axis]).floor() as i64;
        raw.clamp(0, self.grid_dim as i64 - 1) as usize
    }

    fn cell_range(&self, bounds: &Aabb) -> [(usize, usize); 3] {
        [
            (self.cell_coord(bounds.min.x, 0), self.cell_coord(bounds.max.x, 0)),
            (self.cell_coord(bounds.min.y, 1), self.cell_coord(bounds.max.y, 1)),
            (self.cell_coord(bounds.min.z, 2), self.cell_coord(bounds.max.z, 2)),
        ]
    }

    fn cell_hash(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.grid_dim * y + self.grid_dim * self.grid_dim * z
    }

    /// In-level index of the octree leaf above cell `(x, y, z)`.
    ///
    /// Descending from the root picks the octant by the next-highest
    /// coordinate bit, so the in-level index packs the coordinate bits
    /// from most to least significant.
    fn leaf_in_level(&self, x: usize, y: usize, z: usize) -> usize {
        let mut idx = 0usize;
        for bit in (0..self.depth - 1).rev() {
            let octant = ((x >> bit) & 1) | (((y >> bit) & 1) << 1) | (((z >> bit) & 1) << 2);
            idx = (idx << 3) | octant;
        }
        idx
    }

    /// Add `delta` to every internal node on the leaf's path to the root.
    fn bump_counts(&mut self, leaf_in_level: usize, delta: i32) {
        let mut in_level = leaf_in_level;
        let mut level = self.depth - 1;
        while level > 0 {
            level -= 1;
            in_level >>= 3;
            self.counts[self.level_offsets[level] + in_level] += delta;
        }
    }

    /// Cell at `(x, y, z)`, allocating and seating its leaf reference on
    /// first use.
    fn ensure_cell(&mut self, x: usize, y: usize, z: usize) -> usize {
        let hash = self.cell_hash(x, y, z);
        if self.cells[hash].is_none() {
            self.cells[hash] = Some(Cell::new());
            let leaf = self.leaf_in_level(x, y, z);
            self.counts[self.level_offsets[self.depth - 1] + leaf] = hash as i32;
        }
        hash
    }

    // ===== PACKED ARRAYS =====

    fn grow(&mut self) {
        let capacity = self.elements.len();
        let new_capacity = (capacity + capacity / 2).max(capacity + 1);
        self.elements.resize_with(new_capacity, || None);
        self.aabbs.resize(new_capacity * 6, 0.0);
        self.query_ids.resize(new_capacity, 0);
    }

    fn find(&self, item: &T) -> Option<usize> {
        (0..self.size).find(|&slot| self.elements[slot].as_ref() == Some(item))
    }

    // ===== FRUSTUM DESCENT =====

    fn frustum_node(
        &mut self,
        frustum: &Frustum,
        level: usize,
        in_level: usize,
        bounds: &mut Aabb,
        state: &mut PlaneState,
        mut inside: bool,
        query_id: u64,
        cb: &mut dyn FnMut(&T, &Aabb),
    ) {
        if !inside {
            match frustum.intersects(bounds, Some(state)) {
                FrustumTest::Outside => return,
                FrustumTest::Inside => inside = true,
                FrustumTest::Intersect => {}
            }
        }

        let leaf_level = self.depth - 1;
        if level == leaf_level {
            let cell_ref = self.counts[self.level_offsets[level] + in_level];
            if cell_ref < 0 {
                return;
            }
            let Some(cell) = self.cells[cell_ref as usize].as_ref() else {
                return;
            };
            for &key in &cell.keys {
                if self.query_ids[key] == query_id {
                    continue;
                }
                self.query_ids[key] = query_id;
                let item_bounds = read_aabb(&self.aabbs, key);
                if inside || frustum.intersects(&item_bounds, None) != FrustumTest::Outside {
                    if let Some(item) = self.elements[key].as_ref() {
                        cb(item, &item_bounds);
                    }
                }
            }
            return;
        }

        for octant in 0..8 {
            let child_in_level = (in_level << 3) | octant;
            let child_entry = self.counts[self.level_offsets[level + 1] + child_in_level];
            let populated = if level + 1 == leaf_level {
                child_entry >= 0
            } else {
                child_entry > 0
            };
            if !populated {
                continue;
            }
            step_into_child(bounds, octant);
            let saved = *state;
            self.frustum_node(
                frustum,
                level + 1,
                child_in_level,
                bounds,
                state,
                inside,
                query_id,
                cb,
            );
            *state = saved;
            step_out_to_parent(bounds, octant);
        }
    }
}

impl<T: PartialEq> Default for GridOctree<T> {
    /// Depth-6 octree over the `[-50, 50]³` cube.
    fn default() -> Self {
        let half = DVec3::splat(50.0);
        Self::build(Aabb::new(-half, half), 6)
    }
}

// ===== SPATIAL INDEX TRAIT =====

impl<T: PartialEq> SpatialIndex<T> for GridOctree<T> {
    fn add(&mut self, item: T, bounds: &Aabb) -> bool {
        if !self.extent.contains(bounds) {
            return false;
        }
        let slot = self.size;
        if slot == self.elements.len() {
            self.grow();
        }
        self.elements[slot] = Some(item);
        write_aabb(&mut self.aabbs, slot, bounds);
        self.query_ids[slot] = 0;

        let [(x0, x1), (y0, y1), (z0, z1)] = self.cell_range(bounds);
        for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let hash = self.ensure_cell(x, y, z);
                    if let Some(cell) = self.cells[hash].as_mut() {
                        cell.keys.push(slot);
                        cell.lifetime = 0;
                    }
                    let leaf = self.leaf_in_level(x, y, z);
                    self.bump_counts(leaf, 1);
                }
            }
        }

        self.size += 1;
        true
    }

    fn remove(&mut self, item: &T) -> bool {
        let Some(slot) = self.find(item) else {
            return false;
        };

        let bounds = read_aabb(&self.aabbs, slot);
        let [(x0, x1), (y0, y1), (z0, z1)] = self.cell_range(&bounds);
        for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let hash = self.cell_hash(x, y, z);
                    if let Some(cell) = self.cells[hash].as_mut() {
                        if let Some(pos) = cell.keys.iter().position(|&k| k == slot) {
                            cell.keys.swap_remove(pos);
                        }
                    }
                    let leaf = self.leaf_in_level(x, y, z);
                    self.bump_counts(leaf, -1);
                }
            }
        }

        let tail = self.size - 1;
        if slot != tail {
            // Move the tail item into the vacated slot, then retarget
            // every cell reference still naming the old tail index.
            self.elements.swap(slot, tail);
            let moved = read_aabb(&self.aabbs, tail);
            write_aabb(&mut self.aabbs, slot, &moved);
            self.query_ids[slot] = self.query_ids[tail];

            let [(x0, x1), (y0, y1), (z0, z1)] = self.cell_range(&moved);
            for z in z0..=z1 {
                for y in y0..=y1 {
                    for x in x0..=x1 {
                        let hash = self.cell_hash(x, y, z);
                        if let Some(cell) = self.cells[hash].as_mut() {
                            for key in cell.keys.iter_mut() {
                                if *key == tail {
                                    *key = slot;
                                }
                            }
                        }
                    }
                }
            }
        }
        self.elements[tail] = None;
        self.size -= 1;
        true
    }

    fn clear(&mut self, fast: bool) {
        // Internal levels reset to zero; the leaf level keeps its cell
        // references (released cells unseat theirs below).
        let leaf_offset = self.level_offsets[self.depth - 1];
        for count in &mut self.counts[..leaf_offset] {
            *count = 0;
        }

        let mut released = 0usize;
        for hash in 0..self.cells.len() {
            let release = match self.cells[hash].as_mut() {
                Some(cell) => {
                    cell.lifetime += 1;
                    if cell.lifetime > CELL_RETENTION && cell.keys.is_empty() {
                        true
                    } else {
                        cell.keys.clear();
                        false
                    }
                }
                None => continue,
            };
            if release {
                self.cells[hash] = None;
                let x = hash % self.grid_dim;
                let y = (hash / self.grid_dim) % self.grid_dim;
                let z = hash / (self.grid_dim * self.grid_dim);
                let leaf = self.leaf_in_level(x, y, z);
                self.counts[leaf_offset + leaf] = -1;
                released += 1;
            }
        }
        if released > 0 {
            nebula_trace!(
                "nebula::GridOctree",
                "released {} cells empty for more than {} clears",
                released,
                CELL_RETENTION
            );
        }

        if !fast {
            for element in &mut self.elements {
                *element = None;
            }
        }
        self.size = 0;
    }

    fn query_volume(&mut self, volume: &Aabb, cb: &mut dyn FnMut(&T, &Aabb)) {
        if self.size == 0 {
            return;
        }
        self.query_id_counter += 1;
        let query_id = self.query_id_counter;

        let [(x0, x1), (y0, y1), (z0, z1)] = self.cell_range(volume);
        for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let hash = self.cell_hash(x, y, z);
                    let Some(cell) = self.cells[hash].as_ref() else {
                        continue;
                    };
                    for &key in &cell.keys {
                        if self.query_ids[key] == query_id {
                            continue;
                        }
                        self.query_ids[key] = query_id;
                        let bounds = read_aabb(&self.aabbs, key);
                        if volume.intersects(&bounds) {
                            if let Some(item) = self.elements[key].as_ref() {
                                cb(item, &bounds);
                            }
                        }
                    }
                }
            }
        }
    }

    fn query_frustum(&mut self, frustum: &Frustum, cb: &mut dyn FnMut(&T, &Aabb)) {
        if self.size == 0 {
            return;
        }
        self.query_id_counter += 1;
        let query_id = self.query_id_counter;

        let mut bounds = self.extent;
        let mut state = PlaneState::empty();
        self.frustum_node(frustum, 0, 0, &mut bounds, &mut state, false, query_id, cb);
    }

    fn query_pairs(&mut self, cb: &mut dyn FnMut(&T, &Aabb, &T, &Aabb)) {
        if self.size < 2 {
            return;
        }
        let n = self.grid_dim;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let hash = self.cell_hash(x, y, z);
                    let Some(cell) = self.cells[hash].as_ref() else {
                        continue;
                    };
                    for i in 0..cell.keys.len() {
                        let a = cell.keys[i];
                        let bounds_a = read_aabb(&self.aabbs, a);
                        for j in (i + 1)..cell.keys.len() {
                            let b = cell.keys[j];
                            let bounds_b = read_aabb(&self.aabbs, b);
                            if !bounds_a.intersects(&bounds_b) {
                                continue;
                            }
                            // A pair shared by several cells is reported
                            // only by the cell owning the max-of-mins
                            // corner of the overlap.
                            let owner_x =
                                self.cell_coord(bounds_a.min.x.max(bounds_b.min.x), 0);
                            let owner_y =
                                self.cell_coord(bounds_a.min.y.max(bounds_b.min.y), 1);
                            let owner_z =
                                self.cell_coord(bounds_a.min.z.max(bounds_b.min.z), 2);
                            if (owner_x, owner_y, owner_z) != (x, y, z) {
                                continue;
                            }
                            if let (Some(item_a), Some(item_b)) =
                                (self.elements[a].as_ref(), self.elements[b].as_ref())
                            {
                                cb(item_a, &bounds_a, item_b, &bounds_b);
                            }
                        }
                    }
                }
            }
        }
    }
}

// ===== BOUNDED EXTENT =====

impl<T: PartialEq> BoundedSpatialIndex<T> for GridOctree<T> {
    fn extent(&self) -> &Aabb {
        &self.extent
    }

    fn set_extent(&mut self, extent: Aabb) -> NebulaResult<()> {
        if self.size != 0 {
            return Err(Self::log_err(NebulaError::IndexNotEmpty));
        }
        if !extent.is_consistent() {
            return Err(Self::log_err(NebulaError::InvalidExtent(format!(
                "min {:?} exceeds max {:?}",
                extent.min, extent.max
            ))));
        }
        let size = extent.extent();
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err(Self::log_err(NebulaError::InvalidExtent(format!(
                "zero-volume extent {:?}..{:?}",
                extent.min, extent.max
            ))));
        }
        self.extent = extent;
        self.scale = DVec3::splat(self.grid_dim as f64) / size;
        self.offset = -extent.min;
        nebula_debug!(
            "nebula::GridOctree",
            "extent set to {:?}..{:?}",
            extent.min,
            extent.max
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "grid_octree_tests.rs"]
mod tests;
