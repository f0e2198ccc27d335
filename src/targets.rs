//! Target spheres and the per-frame hit state machine.
//!
//! Every frame the aim ray is tested against all targets. A target the ray
//! touches is stamped "on target"; when a shot is fired, every target stamped
//! within the validity window counts as hit and jumps to a new random
//! position inside the play volume. Targets are never destroyed, only moved.

use cgmath::Vector3;
use instant::{Duration, Instant};
use log::{debug, info};
use rand::{Rng, rngs::StdRng};

use crate::{
    config::{InteractionConfig, PlayVolumeConfig},
    data_structures::scene_graph::NodeId,
    error::InvalidVolume,
    pick::{Ray, SphereHit, intersect_sphere, pick_nearest},
};

/// Axis-aligned box targets are placed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayVolume {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl PlayVolume {
    /// Fails unless every corner coordinate is finite and `min <= max` on
    /// each axis.
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Result<Self, InvalidVolume> {
        let ordered = (0..3).all(|axis| min[axis].is_finite() && max[axis].is_finite() && min[axis] <= max[axis]);
        if !ordered {
            return Err(InvalidVolume {
                min: min.into(),
                max: max.into(),
            });
        }
        Ok(Self { min, max })
    }

    /// Uniformly random point inside the volume.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f32> {
        Vector3::new(
            rng.gen_range(self.min.x..=self.max.x),
            rng.gen_range(self.min.y..=self.max.y),
            rng.gen_range(self.min.z..=self.max.z),
        )
    }

    pub fn contains(&self, point: Vector3<f32>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }
}

impl TryFrom<PlayVolumeConfig> for PlayVolume {
    type Error = InvalidVolume;

    fn try_from(config: PlayVolumeConfig) -> Result<Self, Self::Error> {
        Self::new(config.min.into(), config.max.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Idle,
    OnTarget,
    /// Only reported on the frame the hit happened.
    Hit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Scene node that renders this target.
    pub node: NodeId,
    pub position: Vector3<f32>,
    pub radius: f32,
    pub is_hit: bool,
    pub last_on_target: Option<Instant>,
    on_target_since: Option<Instant>,
    last_hit: Option<Instant>,
    hits: u32,
}

impl Target {
    fn new(node: NodeId, position: Vector3<f32>, radius: f32) -> Self {
        Self {
            node,
            position,
            radius,
            is_hit: false,
            last_on_target: None,
            on_target_since: None,
            last_hit: None,
            hits: 0,
        }
    }

    pub fn is_recently_on_target(&self, now: Instant, window: Duration) -> bool {
        self.last_on_target
            .is_some_and(|at| now.duration_since(at) <= window)
    }

    pub fn state(&self, now: Instant, window: Duration) -> TargetState {
        if self.is_hit || self.last_hit == Some(now) {
            TargetState::Hit
        } else if self.is_recently_on_target(now, window) {
            TargetState::OnTarget
        } else {
            TargetState::Idle
        }
    }

    /// How long the ray has continuously touched this target.
    pub fn dwell(&self, now: Instant) -> Duration {
        self.on_target_since
            .map(|since| now.duration_since(since))
            .unwrap_or_default()
    }

    /// Number of times this target has been hit.
    pub fn hits(&self) -> u32 {
        self.hits
    }
}

/// The target nearest along the aim ray this frame.
pub type FocusedTarget = SphereHit;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub focused: Option<FocusedTarget>,
    /// Indices of the targets hit this frame, already repositioned.
    pub hits: Vec<usize>,
}

pub struct TargetField<R: Rng = StdRng> {
    targets: Vec<Target>,
    volume: PlayVolume,
    radius: f32,
    validity: Duration,
    rng: R,
}

impl<R: Rng> TargetField<R> {
    pub fn new(volume: PlayVolume, radius: f32, validity: Duration, rng: R) -> Self {
        Self {
            targets: Vec::new(),
            volume,
            radius,
            validity,
            rng,
        }
    }

    pub fn from_config(config: &InteractionConfig, rng: R) -> Result<Self, InvalidVolume> {
        Ok(Self::new(
            config.play_volume.try_into()?,
            config.target_radius,
            config.on_target_validity(),
            rng,
        ))
    }

    /// Adds a target at a random position. Returns its index.
    pub fn spawn(&mut self, node: NodeId) -> usize {
        let position = self.volume.sample(&mut self.rng);
        self.spawn_at(node, position)
    }

    pub fn spawn_at(&mut self, node: NodeId, position: Vector3<f32>) -> usize {
        self.targets.push(Target::new(node, position, self.radius));
        self.targets.len() - 1
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub fn volume(&self) -> &PlayVolume {
        &self.volume
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Runs one frame of the state machine.
    ///
    /// With `ray == None` the intersection stage is skipped: stamps from
    /// earlier frames persist and a shot still resolves against them.
    /// A shot hits every recently touched target once, then all hit flags
    /// are cleared for the next shot.
    pub fn update(&mut self, ray: Option<&Ray>, fire: bool, now: Instant) -> FrameOutcome {
        let mut outcome = FrameOutcome {
            focused: ray.and_then(|ray| {
                pick_nearest(ray, self.targets.iter().map(|t| (t.position, t.radius)))
            }),
            hits: Vec::new(),
        };

        for (index, target) in self.targets.iter_mut().enumerate() {
            if let Some(ray) = ray {
                if intersect_sphere(ray.origin, ray.direction(), target.position, target.radius).is_some() {
                    target.last_on_target = Some(now);
                    target.on_target_since.get_or_insert(now);
                } else {
                    target.last_on_target = None;
                    target.on_target_since = None;
                }
            }

            if fire {
                let recently_on_target = target.is_recently_on_target(now, self.validity);
                target.last_on_target = None;
                if recently_on_target && !target.is_hit {
                    let from = target.position;
                    target.position = self.volume.sample(&mut self.rng);
                    target.is_hit = true;
                    target.last_hit = Some(now);
                    target.on_target_since = None;
                    target.hits += 1;
                    info!(
                        "Target {} hit at {:?}, moved to {:?}",
                        index, from, target.position
                    );
                    outcome.hits.push(index);
                }
            }
        }

        if fire {
            self.targets.iter_mut().for_each(|t| t.is_hit = false);
            debug!("Shot resolved with {} hit(s)", outcome.hits.len());
        }
        outcome
    }
}
