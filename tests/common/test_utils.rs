#![allow(dead_code)]

use cgmath::{Deg, InnerSpace, Matrix4, Quaternion, Vector3};
use instant::{Duration, Instant};
use spatial_ngin::{
    config::EngineConfig,
    context::Context,
    data_structures::scene_graph::SceneGraph,
    flow::{Flow, Out},
    hand::{HandAnchor, JointName, RecordedHand, synthetic_hand},
    render::{Render, RenderSurface},
    tracking::{
        AnchorEventKind, AnchorId, AnchorPayload, PlaneAnchor, PlaneClassification, PlaneExtent,
        TrackingEvent,
    },
};

pub const EPSILON: f32 = 1e-4;


pub const HAND: AnchorId = AnchorId(1);

pub fn assert_near(actual: f32, expected: f32, eps: f32) {
    assert!(
        (actual - expected).abs() <= eps,
        "expected {expected}, got {actual} (eps {eps})"
    );
}

pub fn assert_vec_near(actual: Vector3<f32>, expected: Vector3<f32>, eps: f32) {
    assert!(
        (actual - expected).magnitude() <= eps,
        "expected {expected:?}, got {actual:?} (eps {eps})"
    );
}

/// Deterministic config with one target and an untilted aim ray.
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig {
        seed: Some(7),
        ..EngineConfig::default()
    };
    config.interaction.target_count = 1;
    config.interaction.ray_tilt = 0.0;
    config
}

/// Hand pose whose fingers (local +X) point down world -Z, wrist at `wrist`.
pub fn aiming_pose(wrist: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_translation(wrist) * Matrix4::from_angle_y(Deg(90.0))
}

/// The recorded finger gun, ready to fire.
pub fn ready_hand() -> HandAnchor {
    RecordedHand::finger_gun_ready().unwrap().anchor()
}

/// The recorded finger gun with the trigger pulled.
pub fn fired_hand() -> HandAnchor {
    RecordedHand::finger_gun_fired().unwrap().anchor()
}

/// Flat hand, every finger straight.
pub fn open_hand() -> HandAnchor {
    synthetic_hand([0.0; 5])
}

/// Pose that puts `hand`'s wrist at `wrist` with its wrist-to-palm direction
/// pointing down world -Z.
pub fn aiming_pose_for(hand: &HandAnchor, wrist: Vector3<f32>) -> Matrix4<f32> {
    let local = hand.world_joint_positions(&Matrix4::from_translation(Vector3::new(0.0, 0.0, 0.0)));
    let towards_palm = (local.palm().unwrap() - local.get(JointName::Wrist).unwrap()).normalize();
    let rotation = Quaternion::from_arc(towards_palm, Vector3::new(0.0, 0.0, -1.0), None);
    Matrix4::from_translation(wrist - rotation * local.get(JointName::Wrist).unwrap())
        * Matrix4::from(rotation)
}

pub fn hand_event(kind: AnchorEventKind, hand: HandAnchor, wrist: Vector3<f32>) -> TrackingEvent {
    TrackingEvent::new(HAND, kind, aiming_pose_for(&hand, wrist), AnchorPayload::Hand(hand))
}

pub fn plane_event(
    id: u64,
    kind: AnchorEventKind,
    classification: PlaneClassification,
    width: f32,
    height: f32,
    position: Vector3<f32>,
) -> TrackingEvent {
    TrackingEvent::new(
        AnchorId(id),
        kind,
        Matrix4::from_translation(position),
        AnchorPayload::Plane(PlaneAnchor {
            classification,
            extent: PlaneExtent {
                width,
                height,
                anchor_from_extent: Matrix4::from_translation(Vector3::new(0.0, 0.0, 0.0)),
            },
        }),
    )
}

pub fn at(t0: Instant, millis: u64) -> Instant {
    t0 + Duration::from_millis(millis)
}

pub fn init_flow<E, F: Flow<(), E>>(flow: &mut F, ctx: &mut Context) {
    let _ = flow.on_init(ctx, &mut ());
}

pub fn update_flow<E, F: Flow<(), E>>(flow: &mut F, ctx: &mut Context, now: Instant) {
    ctx.now = now;
    let _ = flow.on_update(ctx, &mut (), Duration::from_millis(0));
}

/// Feeds one tracking event and resolves the custom events it produced.
pub fn track<E, F: Flow<(), E>>(flow: &mut F, ctx: &mut Context, event: &TrackingEvent, now: Instant) -> Vec<E> {
    ctx.now = now;
    match flow.on_tracking(ctx, &mut (), event) {
        Out::FutEvent(futures) => futures
            .into_iter()
            .map(|f| futures::executor::block_on(std::pin::Pin::from(f)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Records every command it is handed; optionally rejects opacity changes.
#[derive(Default)]
pub struct RecordingSurface {
    pub applied: Vec<Render>,
    pub reject_opacity: bool,
}

impl RenderSurface for RecordingSurface {
    fn apply(&mut self, command: &Render, _: &SceneGraph) -> anyhow::Result<()> {
        if self.reject_opacity && matches!(command, Render::Opacity { .. }) {
            anyhow::bail!("opacity is not supported");
        }
        self.applied.push(command.clone());
        Ok(())
    }
}
