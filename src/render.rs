//! Render commands handed from the scene arena to a rendering surface.
//!
//! The engine never draws anything itself. Each frame the scene arena queues
//! one [`Render`] command per change (a new world transform, a mesh or material
//! assignment, an opacity change or a removed subtree) and the owner of the
//! [`RenderSurface`] applies them to whatever retained-mode renderer it wraps.

use log::{debug, error};

use crate::data_structures::{
    scene_graph::{Material, MeshId, NodeId, SceneGraph},
    transform::Transform,
};

/// A single change the renderer has to mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    /// The node's world transform changed.
    Transform { node: NodeId, transform: Transform },
    /// The node now draws `mesh` (or `mesh` was replaced in place).
    Mesh { node: NodeId, mesh: MeshId },
    Material { node: NodeId, material: Material },
    Opacity { node: NodeId, opacity: f32 },
    /// The node and its whole subtree were removed from the scene.
    Detach { node: NodeId },
}

impl Render {
    pub fn node(&self) -> NodeId {
        match self {
            Render::Transform { node, .. }
            | Render::Mesh { node, .. }
            | Render::Material { node, .. }
            | Render::Opacity { node, .. }
            | Render::Detach { node } => *node,
        }
    }
}

/// The seam to a retained-mode renderer.
///
/// `scene` is passed along so a surface can look up mesh buffers when it sees
/// a [`Render::Mesh`] command.
pub trait RenderSurface {
    fn apply(&mut self, command: &Render, scene: &SceneGraph) -> anyhow::Result<()>;
}

/// Applies `commands` in order. Surface failures are logged and skipped so
/// one bad command never aborts the frame.
pub fn flush<R: RenderSurface + ?Sized>(commands: &[Render], scene: &SceneGraph, surface: &mut R) -> usize {
    let mut applied = 0;
    for command in commands {
        match surface.apply(command, scene) {
            Ok(()) => applied += 1,
            Err(e) => error!("Render surface rejected {:?}: {:#}", command, e),
        }
    }
    debug!("Flushed {}/{} render commands", applied, commands.len());
    applied
}
