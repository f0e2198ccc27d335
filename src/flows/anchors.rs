//! Detected planes mirrored into the scene as tinted quads.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    context::Context,
    data_structures::{
        scene_graph::{Material, MeshId, NodeId},
        transform::Transform,
    },
    flow::{Flow, FlowConstructor, Out},
    resources::build_plane,
    tracking::{AnchorEventKind, AnchorId, PlaneAnchor, PlaneClassification, TrackingEvent},
};

/// Scene nodes of one mirrored plane anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirroredPlane {
    /// Follows the anchor pose.
    pub entity: NodeId,
    /// Child of `entity` carrying the quad, placed by the extent transform.
    pub plane: NodeId,
    pub mesh: MeshId,
}

/// Keeps one entity per plane anchor in sync with the tracking provider.
///
/// Windows are skipped entirely; they would cover the view of the outside.
#[derive(Debug, Default)]
pub struct PlaneMirror {
    root: Option<NodeId>,
    planes: HashMap<AnchorId, MirroredPlane>,
}

impl PlaneMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructor<S: 'static, E: 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|_| {
            Box::pin(async move {
                let flow: Box<dyn Flow<S, E>> = Box::new(PlaneMirror::new());
                anyhow::Ok(flow)
            })
        });
        constructor
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, anchor: AnchorId) -> Option<&MirroredPlane> {
        self.planes.get(&anchor)
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    fn upsert(&mut self, ctx: &mut Context, event: &TrackingEvent, plane: &PlaneAnchor) -> anyhow::Result<()> {
        let mesh = build_plane(plane.extent.width, plane.extent.height)?;
        let extent_transform = Transform::from_matrix(&plane.extent.anchor_from_extent);
        let scene = &mut ctx.scene;

        let mirrored = match self.planes.get(&event.anchor).copied() {
            Some(mirrored) => {
                scene.replace_mesh(mirrored.mesh, mesh)?;
                scene.set_local_transform(mirrored.plane, extent_transform)?;
                mirrored
            }
            None => {
                let entity = scene.add_node(format!("anchor-{}", event.anchor.0), self.root)?;
                let plane_node = scene.add_node("plane", Some(entity))?;
                let mesh = scene.insert_mesh(mesh);
                scene.set_mesh(plane_node, mesh)?;
                scene.set_material(plane_node, Material::unlit(plane.classification.color()))?;
                scene.set_local_transform(plane_node, extent_transform)?;
                let mirrored = MirroredPlane {
                    entity,
                    plane: plane_node,
                    mesh,
                };
                self.planes.insert(event.anchor, mirrored);
                debug!("Mirroring {:?} plane {:?}", plane.classification, event.anchor);
                mirrored
            }
        };
        scene.set_local_transform(mirrored.entity, Transform::from_matrix(&event.origin_from_anchor))?;
        Ok(())
    }

    fn remove(&mut self, ctx: &mut Context, anchor: AnchorId) {
        match self.planes.remove(&anchor) {
            Some(mirrored) => {
                if let Err(e) = ctx.scene.remove(mirrored.entity) {
                    warn!("Could not remove plane {:?}: {}", anchor, e);
                }
            }
            None => debug!("Removal of unknown plane {:?} ignored", anchor),
        }
    }
}

impl<S, E> Flow<S, E> for PlaneMirror {
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S, E> {
        match ctx.scene.add_node("planes", None) {
            Ok(root) => self.root = Some(root),
            Err(e) => warn!("Could not create the plane root: {}", e),
        }
        Out::Empty
    }

    fn on_tracking(&mut self, ctx: &mut Context, _: &mut S, event: &TrackingEvent) -> Out<S, E> {
        let Some(plane) = event.plane() else {
            return Out::Empty;
        };
        if plane.classification == PlaneClassification::Window {
            return Out::Empty;
        }
        match event.kind {
            AnchorEventKind::Added | AnchorEventKind::Updated => {
                if let Err(e) = self.upsert(ctx, event, plane) {
                    warn!("Plane {:?} not mirrored: {:#}", event.anchor, e);
                }
            }
            AnchorEventKind::Removed => self.remove(ctx, event.anchor),
        }
        Out::Empty
    }

    fn on_update(&mut self, _: &mut Context, _: &mut S, _: instant::Duration) -> Out<S, E> {
        Out::Empty
    }
}
