//! Finger-gun target practice.
//!
//! The aiming hand is followed through the tracking stream. Each hand update
//! runs the whole interaction pipeline to completion:
//!
//! 1. score the hand against the ready and fired reference poses,
//! 2. feed the scores to the gesture gates (which may fire a shot),
//! 3. derive the aim ray from the wrist and palm,
//! 4. run the target state machine with the ray and the shot,
//! 5. move hit targets and stretch the laser to the focused target.
//!
//! Hits and shots are reported as custom events.

use cgmath::Vector3;
use instant::{Duration, Instant};
use log::{debug, warn};
use rand::{Rng, rngs::StdRng};

use crate::{
    aim::AimIndicator,
    config::{EngineConfig, InteractionConfig},
    context::{Context, InitContext},
    data_structures::{
        mesh::{Mesh, WHITE, pack_rgba},
        scene_graph::{Material, NodeId},
    },
    flow::{Flow, FlowConstructor, Out},
    gesture::{GestureRecognizer, GestureSignal, HandGestureState},
    hand::HandAnchor,
    pick::Ray,
    pose::HandPose,
    resources::build_sphere,
    targets::{FrameOutcome, TargetField},
    tracking::{AnchorEventKind, TrackingEvent},
};

const TARGET_BANDS: u32 = 15;

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeEvent {
    ShotFired { hits: usize },
    TargetHit {
        index: usize,
        node: NodeId,
        moved_to: Vector3<f32>,
    },
}

/// Scene nodes owned by the practice range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeNodes {
    pub root: NodeId,
    pub laser: NodeId,
    pub gun: NodeId,
}

pub struct TargetPractice<R: Rng = StdRng> {
    interaction: InteractionConfig,
    field: TargetField<R>,
    recognizer: GestureRecognizer,
    aim: AimIndicator,
    ready_pose: HandPose,
    fired_pose: HandPose,
    target_mesh: Option<Mesh>,
    nodes: Option<PracticeNodes>,
    last_ray: Option<Ray>,
    last_outcome: FrameOutcome,
}

impl<R: Rng> TargetPractice<R> {
    /// Fails on an invalid `config` or if the built-in hand poses cannot be read.
    pub fn new(config: &EngineConfig, rng: R) -> anyhow::Result<Self> {
        config.validate()?;
        let interaction = config.interaction.clone();
        let target_mesh = build_sphere(interaction.target_radius, TARGET_BANDS, TARGET_BANDS)?;
        Ok(Self {
            field: TargetField::from_config(&interaction, rng)?,
            recognizer: GestureRecognizer::new(&config.gesture),
            aim: AimIndicator::new(&interaction),
            ready_pose: HandPose::finger_gun_ready()?,
            fired_pose: HandPose::finger_gun_fired()?,
            target_mesh: Some(target_mesh),
            nodes: None,
            last_ray: None,
            last_outcome: FrameOutcome::default(),
            interaction,
        })
    }

    pub fn field(&self) -> &TargetField<R> {
        &self.field
    }

    pub fn gestures(&self) -> &HandGestureState {
        self.recognizer.state()
    }

    pub fn aim(&self) -> &AimIndicator {
        &self.aim
    }

    pub fn nodes(&self) -> Option<PracticeNodes> {
        self.nodes
    }

    /// Aim ray of the latest hand update, if the hand had the needed joints.
    pub fn last_ray(&self) -> Option<Ray> {
        self.last_ray
    }

    pub fn last_outcome(&self) -> &FrameOutcome {
        &self.last_outcome
    }

    fn build_scene(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        let scene = &mut ctx.scene;
        let root = scene.add_node("target-practice", None)?;
        let laser = scene.add_node("laser", Some(root))?;
        let gun = scene.add_node("gun", Some(root))?;
        scene.set_material(laser, Material::unlit(pack_rgba(255, 0, 0, 255)))?;
        scene.set_opacity(laser, 0.0)?;
        scene.set_opacity(gun, 0.0)?;
        self.nodes = Some(PracticeNodes { root, laser, gun });

        let Some(mesh) = self.target_mesh.take() else {
            return Ok(());
        };
        let mesh = scene.insert_mesh(mesh);
        let material = Material::unlit(WHITE);
        for i in 0..self.interaction.target_count {
            let node = scene.add_node(format!("target-{i}"), Some(root))?;
            scene.set_mesh(node, mesh)?;
            scene.set_material(node, material)?;
            let index = self.field.spawn(node);
            if let Some(target) = self.field.target(index) {
                scene.set_position(node, target.position)?;
            }
        }
        debug!("Spawned {} targets", self.field.targets().len());
        Ok(())
    }

    fn apply_signal(&mut self, signal: GestureSignal, now: Instant) {
        if let Some(shown) = signal.aim_shown {
            self.aim.set_visible(shown);
        }
        if signal.fired {
            self.aim.flash(now);
        }
    }

    fn sync_opacity(&self, ctx: &mut Context) -> anyhow::Result<()> {
        if let Some(nodes) = self.nodes {
            ctx.scene.set_opacity(nodes.laser, self.aim.opacity())?;
            let gun = if self.aim.is_visible() { 1.0 } else { 0.0 };
            ctx.scene.set_opacity(nodes.gun, gun)?;
        }
        Ok(())
    }

    fn process_hand(
        &mut self,
        ctx: &mut Context,
        event: &TrackingEvent,
        hand: &HandAnchor,
    ) -> anyhow::Result<Vec<PracticeEvent>> {
        let now = ctx.now;
        let mut events = Vec::new();

        self.recognizer.begin_frame();
        let pose = HandPose::from_anchor(hand);
        let ready = pose.similarity(&self.ready_pose).map(|s| s.average);
        let trigger = pose.similarity(&self.fired_pose).map(|s| s.average);
        let signal = self.recognizer.evaluate(ready, trigger, now);
        self.apply_signal(signal, now);

        let joints = hand.world_joint_positions(&event.origin_from_anchor);
        let ray = joints.aim_ray(self.interaction.ray_tilt);
        if ray.is_none() {
            debug!("Hand {:?} lacks wrist or palm joints, aim skipped", event.anchor);
        }
        let outcome = self.field.update(ray.as_ref(), signal.fired, now);

        if signal.fired {
            events.push(PracticeEvent::ShotFired {
                hits: outcome.hits.len(),
            });
        }
        for &index in outcome.hits.iter() {
            if let Some(target) = self.field.target(index) {
                ctx.scene.set_position(target.node, target.position)?;
                events.push(PracticeEvent::TargetHit {
                    index,
                    node: target.node,
                    moved_to: target.position,
                });
            }
        }

        if let (Some(ray), Some(nodes)) = (ray, self.nodes) {
            let length = outcome
                .focused
                .map(|focused| focused.distance)
                .unwrap_or(self.interaction.default_ray_length);
            let end = ray.at(length);
            ctx.scene.set_local_transform(nodes.laser, self.aim.laser(ray.origin, end))?;
            ctx.scene.set_local_transform(nodes.gun, self.aim.gun(ray.origin, end))?;
        }
        self.sync_opacity(ctx)?;

        self.last_ray = ray;
        self.last_outcome = outcome;
        Ok(events)
    }
}

impl TargetPractice<StdRng> {
    pub fn constructor<S: 'static, E: From<PracticeEvent> + 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|init: InitContext| {
            Box::pin(async move {
                let flow: Box<dyn Flow<S, E>> =
                    Box::new(TargetPractice::new(&init.config, init.rng())?);
                anyhow::Ok(flow)
            })
        });
        constructor
    }
}

fn emit<S, E: From<PracticeEvent> + 'static>(events: Vec<PracticeEvent>) -> Out<S, E> {
    if events.is_empty() {
        return Out::Empty;
    }
    Out::FutEvent(
        events
            .into_iter()
            .map(|event| Box::new(async move { E::from(event) }) as Box<dyn Future<Output = E>>)
            .collect(),
    )
}

impl<S, E, R> Flow<S, E> for TargetPractice<R>
where
    E: From<PracticeEvent> + 'static,
    R: Rng,
{
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S, E> {
        if let Err(e) = self.build_scene(ctx) {
            warn!("Could not build the practice range: {:#}", e);
        }
        Out::Empty
    }

    fn on_tracking(&mut self, ctx: &mut Context, _: &mut S, event: &TrackingEvent) -> Out<S, E> {
        let Some(hand) = event.hand() else {
            return Out::Empty;
        };
        if hand.chirality != self.interaction.chirality {
            return Out::Empty;
        }
        if event.kind == AnchorEventKind::Removed {
            let signal = self.recognizer.reset();
            self.apply_signal(signal, ctx.now);
            self.last_ray = None;
            if let Err(e) = self.sync_opacity(ctx) {
                warn!("Could not hide the aim: {:#}", e);
            }
            return Out::Empty;
        }
        match self.process_hand(ctx, event, hand) {
            Ok(events) => emit(events),
            Err(e) => {
                warn!("Hand update {:?} dropped: {:#}", event.anchor, e);
                Out::Empty
            }
        }
    }

    fn on_update(&mut self, ctx: &mut Context, _: &mut S, _: Duration) -> Out<S, E> {
        self.recognizer.tick(ctx.now);
        self.aim.tick(ctx.now);
        if let Err(e) = self.sync_opacity(ctx) {
            warn!("Could not update the laser: {:#}", e);
        }
        Out::Empty
    }
}
