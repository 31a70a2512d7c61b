/// HierarchicalOctree — pointer-style dynamic octree.
///
/// Nodes live in an arena and address each other by integer index (no
/// cyclic references). Each node owns eight lazily-created child slots
/// plus a bag of entry keys for items whose aabbs are fully contained in
/// the node but straddle its children.
///
/// The root is unbounded: inserting an item outside the current root
/// allocates a new parent that adopts the old root as one of its eight
/// children, repeated until containment holds. Nodes emptied by removal
/// accumulate in a pending set and are detached in bulk before the next
/// query.
///
/// Insert and remove are O(depth) per item; `insert` returns a stable
/// [`ItemKey`] so callers can move items with [`HierarchicalOctree::update`]
/// without a lookup scan.

use glam::DVec3;
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use crate::error::{NebulaError, NebulaResult};
use crate::math::{Aabb, Frustum, FrustumTest, PlaneState};
use crate::nebula_debug;
use super::spatial_index::SpatialIndex;

new_key_type! {
    /// Stable key for an entry in a [`HierarchicalOctree`].
    ///
    /// Keys remain valid until their own entry is removed, surviving
    /// removals of other entries and node pruning.
    pub struct ItemKey;
}

/// One indexed item: the caller's handle, the cached aabb, and the
/// arena index of the node currently holding it.
struct Entry<T> {
    item: T,
    bounds: Aabb,
    node: u32,
}

/// A single octree node in the arena.
struct Node {
    bounds: Aabb,
    parent: Option<u32>,
    children: [Option<u32>; 8],
    entries: Vec<ItemKey>,
}

impl Node {
    fn leaf_like(bounds: Aabb, parent: Option<u32>) -> Self {
        Self {
            bounds,
            parent,
            children: [None; 8],
            entries: Vec::new(),
        }
    }

    fn is_childless(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Compute the aabb of a specific octant (0–7) of a parent box.
///
/// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z; 0 = negative half,
/// 1 = positive half.
fn octant_aabb(parent: &Aabb, center: &DVec3, octant: usize) -> Aabb {
    Aabb {
        min: DVec3::new(
            if octant & 1 == 0 { parent.min.x } else { center.x },
            if octant & 2 == 0 { parent.min.y } else { center.y },
            if octant & 4 == 0 { parent.min.z } else { center.z },
        ),
        max: DVec3::new(
            if octant & 1 == 0 { center.x } else { parent.max.x },
            if octant & 2 == 0 { center.y } else { parent.max.y },
            if octant & 4 == 0 { center.z } else { parent.max.z },
        ),
    }
}

/// Which octant a point falls into relative to a center (same bit layout).
fn point_octant(center: &DVec3, point: &DVec3) -> usize {
    ((point.x >= center.x) as usize)
        | (((point.y >= center.y) as usize) << 1)
        | (((point.z >= center.z) as usize) << 2)
}

/// Dynamic octree spatial index.
pub struct HierarchicalOctree<T> {
    nodes: Vec<Node>,
    /// Arena slots released by pruning, reused before the arena grows
    free_nodes: Vec<u32>,
    root: u32,
    /// Extent the root is rebuilt with on `clear`
    initial_bounds: Aabb,
    /// Subdivision cap, counted from the current root
    max_depth: u32,
    entries: SlotMap<ItemKey, Entry<T>>,
    /// Nodes emptied by removal, detached in bulk at the next query
    pending: FxHashSet<u32>,
}

impl<T: PartialEq> HierarchicalOctree<T> {
    /// Create a dynamic octree seeded with the given bounds.
    ///
    /// The seed bounds are a starting point, not a limit: the root grows
    /// to cover out-of-bounds insertions. `max_depth` caps subdivision
    /// below the current root (6 is a good default).
    pub fn new(bounds: Aabb, max_depth: u32) -> NebulaResult<Self> {
        if !bounds.is_consistent() {
            return Err(NebulaError::InvalidExtent(format!(
                "min {:?} exceeds max {:?}",
                bounds.min, bounds.max
            )));
        }
        let mut octree = Self {
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            root: 0,
            initial_bounds: bounds,
            max_depth,
            entries: SlotMap::with_key(),
            pending: FxHashSet::default(),
        };
        octree.root = octree.alloc_node(Node::leaf_like(bounds, None));
        nebula_debug!(
            "nebula::HierarchicalOctree",
            "created with seed bounds {:?}..{:?}, max depth {}",
            bounds.min,
            bounds.max,
            max_depth
        );
        Ok(octree)
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ===== ARENA =====

    fn alloc_node(&mut self, node: Node) -> u32 {
        match self.free_nodes.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    // ===== PLACEMENT =====

    /// Grow the root until it contains `target`.
    ///
    /// Each step doubles the root per axis, extending toward the target
    /// so the old root becomes the opposite-half child of the new parent.
    fn grow_root(&mut self, target: &Aabb) {
        while !self.nodes[self.root as usize].bounds.contains(target) {
            let old_bounds = self.nodes[self.root as usize].bounds;
            let size = old_bounds.extent();
            let mut parent_min = old_bounds.min;
            let mut parent_max = old_bounds.max;
            let mut old_root_octant = 0usize;
            for k in 0..3 {
                if target.min[k] < old_bounds.min[k] {
                    parent_min[k] -= size[k];
                    old_root_octant |= 1 << k;
                } else {
                    parent_max[k] += size[k];
                }
            }
            let parent_idx =
                self.alloc_node(Node::leaf_like(Aabb::new(parent_min, parent_max), None));
            self.nodes[parent_idx as usize].children[old_root_octant] = Some(self.root);
            self.nodes[self.root as usize].parent = Some(parent_idx);
            self.root = parent_idx;
        }
    }

    /// Deepest node fully containing `bounds`, creating children on the way.
    ///
    /// Descends while both corners land in the same octant (the box does
    /// not straddle a split plane) and the depth cap allows it.
    fn place(&mut self, bounds: &Aabb) -> u32 {
        let mut node_idx = self.root;
        let mut depth = 0;
        loop {
            if depth >= self.max_depth {
                return node_idx;
            }
            let center = self.nodes[node_idx as usize].bounds.center();
            let min_oct = point_octant(&center, &bounds.min);
            let max_oct = point_octant(&center, &bounds.max);
            if min_oct != max_oct {
                // Straddles a split plane, stays here
                return node_idx;
            }
            node_idx = self.child_or_create(node_idx, min_oct);
            depth += 1;
        }
    }

    fn child_or_create(&mut self, parent_idx: u32, octant: usize) -> u32 {
        if let Some(child) = self.nodes[parent_idx as usize].children[octant] {
            return child;
        }
        let parent_bounds = self.nodes[parent_idx as usize].bounds;
        let center = parent_bounds.center();
        let child_bounds = octant_aabb(&parent_bounds, &center, octant);
        let child_idx = self.alloc_node(Node::leaf_like(child_bounds, Some(parent_idx)));
        self.nodes[parent_idx as usize].children[octant] = Some(child_idx);
        child_idx
    }

    // ===== KEYED API =====

    /// Insert an item and return its stable key.
    ///
    /// Never rejects: the root grows to cover any consistent aabb.
    pub fn insert(&mut self, item: T, bounds: &Aabb) -> ItemKey {
        self.grow_root(bounds);
        let node_idx = self.place(bounds);
        let key = self.entries.insert(Entry {
            item,
            bounds: *bounds,
            node: node_idx,
        });
        self.nodes[node_idx as usize].entries.push(key);
        key
    }

    /// Move an entry to new bounds.
    ///
    /// Cheap when the deepest containing node is unchanged (e.g. small
    /// motion). Returns `false` if the key is stale.
    pub fn update(&mut self, key: ItemKey, bounds: &Aabb) -> bool {
        let old_node = match self.entries.get(key) {
            Some(entry) => entry.node,
            None => return false,
        };
        self.grow_root(bounds);
        let target = self.place(bounds);
        if target != old_node {
            self.detach_entry(old_node, key);
            self.nodes[target as usize].entries.push(key);
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.bounds = *bounds;
            entry.node = target;
        }
        true
    }

    /// Remove an entry by its key. Returns `false` if the key is stale.
    pub fn remove_key(&mut self, key: ItemKey) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        self.detach_entry(entry.node, key);
        true
    }

    /// Find the key of the first entry whose item equals `item`.
    pub fn find(&self, item: &T) -> Option<ItemKey> {
        self.entries
            .iter()
            .find(|(_, entry)| &entry.item == item)
            .map(|(key, _)| key)
    }

    fn detach_entry(&mut self, node_idx: u32, key: ItemKey) {
        let node = &mut self.nodes[node_idx as usize];
        if let Some(pos) = node.entries.iter().position(|&k| k == key) {
            node.entries.swap_remove(pos);
        }
        if node.entries.is_empty() && node.is_childless() && node_idx != self.root {
            self.pending.insert(node_idx);
        }
    }

    // ===== PRUNE =====

    /// Detach nodes emptied by removals, cascading upward.
    ///
    /// Runs at query entry so removal itself stays cheap.
    fn prune(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut work: Vec<u32> = self.pending.drain().collect();
        while let Some(idx) = work.pop() {
            if idx == self.root {
                continue;
            }
            let (empty, childless, parent) = {
                let node = &self.nodes[idx as usize];
                (node.entries.is_empty(), node.is_childless(), node.parent)
            };
            // parent == None means already detached (or root)
            let Some(parent_idx) = parent else { continue };
            if !empty || !childless {
                continue;
            }
            let parent_node = &mut self.nodes[parent_idx as usize];
            for child in parent_node.children.iter_mut() {
                if *child == Some(idx) {
                    *child = None;
                }
            }
            let parent_prunable =
                parent_node.entries.is_empty() && parent_node.is_childless();
            let node = &mut self.nodes[idx as usize];
            node.parent = None;
            node.entries.clear();
            self.free_nodes.push(idx);
            if parent_prunable && parent_idx != self.root {
                work.push(parent_idx);
            }
        }
    }

    // ===== TRAVERSAL =====

    fn volume_node(&self, idx: u32, volume: &Aabb, cb: &mut dyn FnMut(&T, &Aabb)) {
        let node = &self.nodes[idx as usize];
        for &key in &node.entries {
            if let Some(entry) = self.entries.get(key) {
                if volume.intersects(&entry.bounds) {
                    cb(&entry.item, &entry.bounds);
                }
            }
        }
        if node.is_childless() {
            return;
        }
        let center = node.bounds.center();
        let min_oct = point_octant(&center, &volume.min);
        let max_oct = point_octant(&center, &volume.max);
        for octant in 0..8 {
            // Child half-space codes must agree with the query's codes
            if (octant & min_oct) != min_oct || (octant | max_oct) != max_oct {
                continue;
            }
            if let Some(child) = node.children[octant] {
                self.volume_node(child, volume, cb);
            }
        }
    }

    fn frustum_node(
        &self,
        idx: u32,
        frustum: &Frustum,
        state: &mut PlaneState,
        mut inside: bool,
        cb: &mut dyn FnMut(&T, &Aabb),
    ) {
        let node = &self.nodes[idx as usize];
        if !inside {
            match frustum.intersects(&node.bounds, Some(state)) {
                FrustumTest::Outside => return,
                FrustumTest::Inside => inside = true,
                FrustumTest::Intersect => {}
            }
        }
        for &key in &node.entries {
            if let Some(entry) = self.entries.get(key) {
                if inside || frustum.intersects(&entry.bounds, None) != FrustumTest::Outside {
                    cb(&entry.item, &entry.bounds);
                }
            }
        }
        for octant in 0..8 {
            if let Some(child) = node.children[octant] {
                let saved = *state;
                self.frustum_node(child, frustum, state, inside, cb);
                *state = saved;
            }
        }
    }

    fn pairs_node(
        &self,
        idx: u32,
        ancestors: &mut Vec<ItemKey>,
        cb: &mut dyn FnMut(&T, &Aabb, &T, &Aabb),
    ) {
        let node = &self.nodes[idx as usize];
        for i in 0..node.entries.len() {
            let Some(a) = self.entries.get(node.entries[i]) else {
                continue;
            };
            for j in (i + 1)..node.entries.len() {
                let Some(b) = self.entries.get(node.entries[j]) else {
                    continue;
                };
                if a.bounds.intersects(&b.bounds) {
                    cb(&a.item, &a.bounds, &b.item, &b.bounds);
                }
            }
            // Entries higher up the spine can only meet descendants here
            for &ancestor_key in ancestors.iter() {
                let Some(ancestor) = self.entries.get(ancestor_key) else {
                    continue;
                };
                if ancestor.bounds.intersects(&a.bounds) {
                    cb(&ancestor.item, &ancestor.bounds, &a.item, &a.bounds);
                }
            }
        }
        let pushed = node.entries.len();
        ancestors.extend_from_slice(&node.entries);
        for octant in 0..8 {
            if let Some(child) = node.children[octant] {
                self.pairs_node(child, ancestors, cb);
            }
        }
        ancestors.truncate(ancestors.len() - pushed);
    }
}

// ===== SPATIAL INDEX TRAIT =====

impl<T: PartialEq> SpatialIndex<T> for HierarchicalOctree<T> {
    fn add(&mut self, item: T, bounds: &Aabb) -> bool {
        self.insert(item, bounds);
        true
    }

    fn remove(&mut self, item: &T) -> bool {
        match self.find(item) {
            Some(key) => self.remove_key(key),
            None => false,
        }
    }

    fn clear(&mut self, fast: bool) {
        self.entries.clear();
        self.pending.clear();
        self.free_nodes.clear();
        let root = Node::leaf_like(self.initial_bounds, None);
        if fast {
            // Keep arena storage; husk every node for reuse
            for node in &mut self.nodes {
                node.entries.clear();
                node.children = [None; 8];
                node.parent = None;
            }
            for spare in 1..self.nodes.len() as u32 {
                self.free_nodes.push(spare);
            }
            self.nodes[0] = root;
        } else {
            self.nodes.clear();
            self.nodes.push(root);
        }
        self.root = 0;
    }

    fn query_volume(&mut self, volume: &Aabb, cb: &mut dyn FnMut(&T, &Aabb)) {
        self.prune();
        self.volume_node(self.root, volume, cb);
    }

    fn query_frustum(&mut self, frustum: &Frustum, cb: &mut dyn FnMut(&T, &Aabb)) {
        self.prune();
        let mut state = PlaneState::empty();
        self.frustum_node(self.root, frustum, &mut state, false, cb);
    }

    fn query_pairs(&mut self, cb: &mut dyn FnMut(&T, &Aabb, &T, &Aabb)) {
        self.prune();
        let mut ancestors = Vec::new();
        self.pairs_node(self.root, &mut ancestors, cb);
    }
}

#[cfg(test)]
#[path = "hierarchical_octree_tests.rs"]
mod tests;
