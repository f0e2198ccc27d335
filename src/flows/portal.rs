//! A portal that opens in the largest ceiling found during a short scan.

use cgmath::{Matrix4, Vector3};
use instant::{Duration, Instant};
use log::{debug, info, warn};

use crate::{
    config::PortalConfig,
    context::{Context, InitContext},
    data_structures::{
        mesh::WHITE,
        scene_graph::{Material, NodeId},
        transform::Transform,
    },
    flow::{Flow, FlowConstructor, Out},
    resources::build_plane,
    tracking::{AnchorEventKind, PlaneClassification, TrackingEvent},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortalPhase {
    /// Collecting ceiling planes.
    Detecting,
    Growing { node: NodeId, since: Instant },
    Open { node: NodeId },
    /// The scan ended without a ceiling.
    Abandoned,
}

pub struct CeilingPortal {
    config: PortalConfig,
    scan_started: Option<Instant>,
    max_radius: f32,
    pose: Option<Matrix4<f32>>,
    base: Transform,
    phase: PortalPhase,
}

impl CeilingPortal {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            config: config.clone(),
            scan_started: None,
            max_radius: 0.0,
            pose: None,
            base: Transform::default(),
            phase: PortalPhase::Detecting,
        }
    }

    pub fn constructor<S: 'static, E: 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|init: InitContext| {
            Box::pin(async move {
                let flow: Box<dyn Flow<S, E>> = Box::new(CeilingPortal::new(&init.config.portal));
                anyhow::Ok(flow)
            })
        });
        constructor
    }

    pub fn phase(&self) -> PortalPhase {
        self.phase
    }

    /// Radius of the largest ceiling seen so far.
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    pub fn portal_node(&self) -> Option<NodeId> {
        match self.phase {
            PortalPhase::Growing { node, .. } | PortalPhase::Open { node } => Some(node),
            _ => None,
        }
    }

    fn consider(&mut self, event: &TrackingEvent) {
        let Some(plane) = event.plane() else {
            return;
        };
        if plane.classification != PlaneClassification::Ceiling || event.kind == AnchorEventKind::Removed {
            return;
        }
        let radius = plane.extent.width.min(plane.extent.height) * self.config.radius_factor;
        if radius > self.max_radius {
            debug!("Ceiling {:?} is the largest so far (radius {:.2})", event.anchor, radius);
            self.max_radius = radius;
            self.pose = Some(event.origin_from_anchor);
        }
    }

    fn open(&mut self, ctx: &mut Context) -> anyhow::Result<PortalPhase> {
        let Some(pose) = self.pose else {
            info!("No ceiling found, the portal stays closed");
            return Ok(PortalPhase::Abandoned);
        };
        let mesh = build_plane(self.max_radius, self.max_radius)?;
        let scene = &mut ctx.scene;
        let node = scene.add_node("portal", None)?;
        let mesh = scene.insert_mesh(mesh);
        scene.set_mesh(node, mesh)?;
        scene.set_material(node, Material::unlit(WHITE))?;
        self.base = Transform::from_matrix(&pose);
        scene.set_local_transform(
            node,
            Transform {
                scale: Vector3::new(0.0, 0.0, 0.0),
                ..self.base
            },
        )?;
        info!("Portal opened with radius {:.2}", self.max_radius);
        Ok(PortalPhase::Growing {
            node,
            since: ctx.now,
        })
    }

    fn grow(&self, ctx: &mut Context, node: NodeId, since: Instant) -> anyhow::Result<PortalPhase> {
        let elapsed = ctx.now.duration_since(since).as_secs_f32();
        let progress = (elapsed / self.config.grow_secs).min(1.0);
        ctx.scene.set_scale(node, self.base.scale * progress)?;
        Ok(if progress >= 1.0 {
            PortalPhase::Open { node }
        } else {
            PortalPhase::Growing { node, since }
        })
    }
}

impl<S, E> Flow<S, E> for CeilingPortal {
    fn on_init(&mut self, _: &mut Context, _: &mut S) -> Out<S, E> {
        Out::Empty
    }

    fn on_tracking(&mut self, ctx: &mut Context, _: &mut S, event: &TrackingEvent) -> Out<S, E> {
        self.scan_started.get_or_insert(ctx.now);
        if self.phase == PortalPhase::Detecting {
            self.consider(event);
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &mut Context, _: &mut S, _: Duration) -> Out<S, E> {
        let started = *self.scan_started.get_or_insert(ctx.now);
        let next = match self.phase {
            PortalPhase::Detecting if ctx.now.duration_since(started) >= self.config.detection() => {
                self.open(ctx)
            }
            PortalPhase::Growing { node, since } => self.grow(ctx, node, since),
            phase => Ok(phase),
        };
        match next {
            Ok(phase) => self.phase = phase,
            Err(e) => {
                warn!("Portal failed: {:#}", e);
                self.phase = PortalPhase::Abandoned;
            }
        }
        Out::Empty
    }
}
