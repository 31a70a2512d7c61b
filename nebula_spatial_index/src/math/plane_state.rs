/// Six-bit cull cache threaded through hierarchical frustum traversal.
///
/// Bit `k` set means plane `k` has been proven redundant for every
/// descendant of the current subtree and may be skipped. Traversal code
/// saves the state (it is `Copy`) before descending into a child and
/// restores it on ascent.

use bitflags::bitflags;

bitflags! {
    /// One bit per frustum plane, indexed as the `PLANE_*` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlaneState: u8 {
        /// Near plane proven redundant
        const NEAR   = 1 << 0;
        /// Far plane proven redundant
        const FAR    = 1 << 1;
        /// Top plane proven redundant
        const TOP    = 1 << 2;
        /// Bottom plane proven redundant
        const BOTTOM = 1 << 3;
        /// Left plane proven redundant
        const LEFT   = 1 << 4;
        /// Right plane proven redundant
        const RIGHT  = 1 << 5;
    }
}

impl PlaneState {
    /// Whether plane `k` may be skipped for the current subtree.
    pub fn is_culled(self, plane: usize) -> bool {
        debug_assert!(plane < 6, "plane index out of range: {}", plane);
        self.bits() & (1 << plane) != 0
    }

    /// Record that the current subtree is entirely inside plane `k`.
    pub fn mark_culled(&mut self, plane: usize) {
        debug_assert!(plane < 6, "plane index out of range: {}", plane);
        *self |= Self::from_bits_truncate(1 << plane);
    }

    /// Clear all bits; every plane must be tested again.
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// True iff at least one plane still requires testing.
    ///
    /// When false, a frustum test may return `Inside` without touching
    /// any plane (the fast-exit path).
    pub fn tests_required(self) -> bool {
        !self.is_all()
    }
}

impl Default for PlaneState {
    /// All bits clear: every plane must be tested.
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[path = "plane_state_tests.rs"]
mod tests;
