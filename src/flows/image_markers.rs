//! A small marker sphere on every detected reference image.

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
    resources::build_sphere,
    tracking::{AnchorEventKind, AnchorId, ImageAnchor, TrackingEvent},
};

pub const MARKER_RADIUS: f32 = 0.05;

/// Places one marker per image anchor.
///
/// A marker keeps its last tracked pose while the image is not tracked, and
/// is removed together with its anchor.
#[derive(Debug, Default)]
pub struct ImageMarkers {
    root: Option<NodeId>,
    mesh: Option<MeshId>,
    markers: HashMap<AnchorId, NodeId>,
}

impl ImageMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructor<S: 'static, E: 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|_| {
            Box::pin(async move {
                let flow: Box<dyn Flow<S, E>> = Box::new(ImageMarkers::new());
                anyhow::Ok(flow)
            })
        });
        constructor
    }

    /// Translucent blue, unlit.
    pub fn material() -> Material {
        Material::unlit(pack_rgba(0, 0, 255, 166))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Sphere shared by every marker.
    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    pub fn marker(&self, anchor: AnchorId) -> Option<NodeId> {
        self.markers.get(&anchor).copied()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn build_scene(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        self.root = Some(ctx.scene.add_node("image-markers", None)?);
        let sphere = build_sphere(MARKER_RADIUS, 15, 15)?;
        self.mesh = Some(ctx.scene.insert_mesh(sphere));
        Ok(())
    }

    fn track(&mut self, ctx: &mut Context, event: &TrackingEvent, image: &ImageAnchor) -> anyhow::Result<()> {
        let marker = match self.markers.get(&event.anchor) {
            Some(&marker) => marker,
            None => {
                let marker = ctx.scene.add_node(format!("image-{}", event.anchor.0), self.root)?;
                if let Some(mesh) = self.mesh {
                    ctx.scene.set_mesh(marker, mesh)?;
                }
                ctx.scene.set_material(marker, Self::material())?;
                self.markers.insert(event.anchor, marker);
                debug!("Marking image {:?}", event.anchor);
                marker
            }
        };
        if image.is_tracked {
            ctx.scene
                .set_local_transform(marker, Transform::from_matrix(&event.origin_from_anchor))?;
        }
        Ok(())
    }

    fn remove(&mut self, ctx: &mut Context, anchor: AnchorId) {
        match self.markers.remove(&anchor) {
            Some(marker) => {
                if let Err(e) = ctx.scene.remove(marker) {
                    warn!("Could not remove image marker {:?}: {}", anchor, e);
                }
            }
            None => debug!("Removal of unknown image {:?} ignored", anchor),
        }
    }
}

impl<S, E> Flow<S, E> for ImageMarkers {
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S, E> {
        if let Err(e) = self.build_scene(ctx) {
            warn!("Could not build the image markers: {:#}", e);
        }
        Out::Empty
    }

    fn on_tracking(&mut self, ctx: &mut Context, _: &mut S, event: &TrackingEvent) -> Out<S, E> {
        let Some(image) = event.image() else {
            return Out::Empty;
        };
        match event.kind {
            AnchorEventKind::Added | AnchorEventKind::Updated => {
                if let Err(e) = self.track(ctx, event, image) {
                    warn!("Image {:?} not marked: {:#}", event.anchor, e);
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
