//! Error types for the Nebula spatial index
//!
//! This module defines the typed failures surfaced by constructors and
//! reconfiguration. Out-of-extent insertions and removals of absent items
//! are NOT errors — they are `false` returns on the index contract.

use std::fmt;

/// Result type for Nebula spatial index operations
pub type NebulaResult<T> = Result<T, NebulaError>;

/// Nebula spatial index errors
#[derive(Debug, Clone, PartialEq)]
pub enum NebulaError {
    /// Octree depth outside the supported range
    InvalidDepth(u32),

    /// Field of view outside (0°, 180°]
    InvalidFieldOfView(f64),

    /// Aspect ratio must be strictly positive
    InvalidAspectRatio(f64),

    /// Inverted frustum edge pair (left > right, bottom > top, near > far)
    InvalidFrustumEdges(String),

    /// Near plane must be strictly positive in a perspective frustum
    InvalidNearPlane(f64),

    /// Inconsistent or degenerate extent aabb
    InvalidExtent(String),

    /// Malformed packed vertex data (empty range, bad stride, out of bounds)
    InvalidVertexData(String),

    /// Reconfiguration requires an empty index (e.g. `set_extent`)
    IndexNotEmpty,
}

impl fmt::Display for NebulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NebulaError::InvalidDepth(depth) => {
                write!(f, "Invalid octree depth: {}", depth)
            }
            NebulaError::InvalidFieldOfView(fov) => {
                write!(f, "Field of view must be in (0, 180] degrees: {}", fov)
            }
            NebulaError::InvalidAspectRatio(aspect) => {
                write!(f, "Aspect ratio must be positive: {}", aspect)
            }
            NebulaError::InvalidFrustumEdges(msg) => {
                write!(f, "Inverted frustum edges: {}", msg)
            }
            NebulaError::InvalidNearPlane(near) => {
                write!(f, "Perspective near plane must be positive: {}", near)
            }
            NebulaError::InvalidExtent(msg) => {
                write!(f, "Invalid extent: {}", msg)
            }
            NebulaError::InvalidVertexData(msg) => {
                write!(f, "Invalid vertex data: {}", msg)
            }
            NebulaError::IndexNotEmpty => {
                write!(f, "Operation requires an empty index")
            }
        }
    }
}

impl std::error::Error for NebulaError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
