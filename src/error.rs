//! Typed errors for geometry generation and the scene arena.
//!
//! Plumbing layers (config loading, flow setup, render surfaces) use `anyhow`;
//! the pure geometry and scene code reports these typed errors so callers can
//! match on what went wrong.

use thiserror::Error;

use crate::data_structures::scene_graph::{MeshId, NodeId, TextureId};

/// Failure while building or validating a mesh.
///
/// A generator that returns an error never hands out a partially built mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("index {index} is out of bounds for a mesh with {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[error("index buffer of length {0} does not form whole triangles")]
    PartialTriangle(usize),
}

impl MeshError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Guard for dimensions that must be finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<(), MeshError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MeshError::invalid(
            name,
            format!("expected a finite value > 0, got {value}"),
        ))
    }
}

/// Guard for segment and band counts.
pub(crate) fn ensure_segments(name: &'static str, value: u32) -> Result<(), MeshError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(MeshError::invalid(name, "expected at least one segment"))
    }
}

/// Failure while mutating the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("mesh {0:?} does not exist")]
    UnknownMesh(MeshId),
    #[error("texture {0:?} does not exist")]
    UnknownTexture(TextureId),
    #[error("attaching {child:?} below {parent:?} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },
}

/// Play volume corners that are not finite or not ordered min <= max.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid play volume from {min:?} to {max:?}")]
pub struct InvalidVolume {
    pub min: [f32; 3],
    pub max: [f32; 3],
}
