//! Reconstructed room geometry mirrored as translucent blue meshes.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    context::Context,
    data_structures::{
        mesh::pack_rgba,
        scene_graph::{Material, MeshId, NodeId},
        transform::Transform,
    },
    flow::{Flow, FlowConstructor, Out},
    tracking::{AnchorEventKind, AnchorId, MeshAnchor, TrackingEvent},
};

/// Scene node and mesh of one reconstructed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirroredMesh {
    pub node: NodeId,
    pub mesh: MeshId,
}

/// Keeps one lit mesh per mesh anchor.
///
/// Updates for chunks that were never added are ignored; the provider always
/// announces a chunk before refining it.
#[derive(Debug, Default)]
pub struct SceneReconstruction {
    root: Option<NodeId>,
    meshes: HashMap<AnchorId, MirroredMesh>,
}

impl SceneReconstruction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructor<S: 'static, E: 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|_| {
            Box::pin(async move {
                let flow: Box<dyn Flow<S, E>> = Box::new(SceneReconstruction::new());
                anyhow::Ok(flow)
            })
        });
        constructor
    }

    /// Translucent blue, lit.
    pub fn material() -> Material {
        Material::lit(pack_rgba(0, 0, 255, 178))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, anchor: AnchorId) -> Option<&MirroredMesh> {
        self.meshes.get(&anchor)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    fn add(&mut self, ctx: &mut Context, event: &TrackingEvent, chunk: &MeshAnchor) -> anyhow::Result<()> {
        let mesh = chunk.to_mesh()?;
        let scene = &mut ctx.scene;
        let mirrored = match self.meshes.get(&event.anchor).copied() {
            Some(mirrored) => {
                scene.replace_mesh(mirrored.mesh, mesh)?;
                mirrored
            }
            None => {
                let node = scene.add_node(format!("mesh-{}", event.anchor.0), self.root)?;
                let mesh = scene.insert_mesh(mesh);
                scene.set_mesh(node, mesh)?;
                scene.set_material(node, Self::material())?;
                let mirrored = MirroredMesh { node, mesh };
                self.meshes.insert(event.anchor, mirrored);
                mirrored
            }
        };
        scene.set_local_transform(mirrored.node, Transform::from_matrix(&event.origin_from_anchor))?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context, event: &TrackingEvent, chunk: &MeshAnchor) -> anyhow::Result<()> {
        let Some(mirrored) = self.meshes.get(&event.anchor).copied() else {
            debug!("Update of unknown mesh {:?} ignored", event.anchor);
            return Ok(());
        };
        ctx.scene.replace_mesh(mirrored.mesh, chunk.to_mesh()?)?;
        ctx.scene
            .set_local_transform(mirrored.node, Transform::from_matrix(&event.origin_from_anchor))?;
        Ok(())
    }

    fn remove(&mut self, ctx: &mut Context, anchor: AnchorId) {
        match self.meshes.remove(&anchor) {
            Some(mirrored) => {
                if let Err(e) = ctx.scene.remove(mirrored.node) {
                    warn!("Could not remove mesh {:?}: {}", anchor, e);
                }
            }
            None => debug!("Removal of unknown mesh {:?} ignored", anchor),
        }
    }
}

impl<S, E> Flow<S, E> for SceneReconstruction {
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S, E> {
        match ctx.scene.add_node("reconstruction", None) {
            Ok(root) => self.root = Some(root),
            Err(e) => warn!("Could not create the reconstruction root: {}", e),
        }
        Out::Empty
    }

    fn on_tracking(&mut self, ctx: &mut Context, _: &mut S, event: &TrackingEvent) -> Out<S, E> {
        let Some(chunk) = event.mesh() else {
            return Out::Empty;
        };
        let result = match event.kind {
            AnchorEventKind::Added => self.add(ctx, event, chunk),
            AnchorEventKind::Updated => self.update(ctx, event, chunk),
            AnchorEventKind::Removed => {
                self.remove(ctx, event.anchor);
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("Mesh {:?} not mirrored: {:#}", event.anchor, e);
        }
        Out::Empty
    }

    fn on_update(&mut self, _: &mut Context, _: &mut S, _: instant::Duration) -> Out<S, E> {
        Out::Empty
    }
}
