//! Geometric primitives consumed by the spatial indices.
//!
//! Double-precision axis-aligned boxes, plane utilities, the six-plane
//! view frustum, the plane-state cull cache, and the optional bound
//! volume sum type.

mod aabb;
mod frustum;
mod plane_state;
mod volume;

pub mod plane;

pub use aabb::Aabb;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_NEAR, PLANE_FAR, PLANE_TOP, PLANE_BOTTOM, PLANE_LEFT, PLANE_RIGHT,
};
pub use plane_state::PlaneState;
pub use volume::{BoundVolume, Sphere};
