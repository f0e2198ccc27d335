//! Tracked hands: joint names, anchors and world-space joint positions.
//!
//! A tracking provider reports a [`HandAnchor`] per hand: the pose of every
//! joint relative to the hand anchor. Combined with the anchor's pose in the
//! world this yields [`JointPositions`], from which the aim ray is derived.

use std::collections::HashMap;

use anyhow::Context as _;
use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::pick::Ray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JointName {
    Wrist,
    ThumbKnuckle,
    ThumbIntermediateBase,
    ThumbIntermediateTip,
    ThumbTip,
    IndexFingerMetacarpal,
    IndexFingerKnuckle,
    IndexFingerIntermediateBase,
    IndexFingerIntermediateTip,
    IndexFingerTip,
    MiddleFingerMetacarpal,
    MiddleFingerKnuckle,
    MiddleFingerIntermediateBase,
    MiddleFingerIntermediateTip,
    MiddleFingerTip,
    RingFingerMetacarpal,
    RingFingerKnuckle,
    RingFingerIntermediateBase,
    RingFingerIntermediateTip,
    RingFingerTip,
    LittleFingerMetacarpal,
    LittleFingerKnuckle,
    LittleFingerIntermediateBase,
    LittleFingerIntermediateTip,
    LittleFingerTip,
    ForearmWrist,
    ForearmArm,
}

impl JointName {
    pub const ALL: [JointName; 27] = [
        JointName::Wrist,
        JointName::ThumbKnuckle,
        JointName::ThumbIntermediateBase,
        JointName::ThumbIntermediateTip,
        JointName::ThumbTip,
        JointName::IndexFingerMetacarpal,
        JointName::IndexFingerKnuckle,
        JointName::IndexFingerIntermediateBase,
        JointName::IndexFingerIntermediateTip,
        JointName::IndexFingerTip,
        JointName::MiddleFingerMetacarpal,
        JointName::MiddleFingerKnuckle,
        JointName::MiddleFingerIntermediateBase,
        JointName::MiddleFingerIntermediateTip,
        JointName::MiddleFingerTip,
        JointName::RingFingerMetacarpal,
        JointName::RingFingerKnuckle,
        JointName::RingFingerIntermediateBase,
        JointName::RingFingerIntermediateTip,
        JointName::RingFingerTip,
        JointName::LittleFingerMetacarpal,
        JointName::LittleFingerKnuckle,
        JointName::LittleFingerIntermediateBase,
        JointName::LittleFingerIntermediateTip,
        JointName::LittleFingerTip,
        JointName::ForearmWrist,
        JointName::ForearmArm,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Little,
    ];

    /// Joints from the knuckle to the tip. Consecutive pairs are the bones
    /// used for pose comparison.
    pub fn chain(self) -> [JointName; 4] {
        use JointName::*;
        match self {
            Finger::Thumb => [ThumbKnuckle, ThumbIntermediateBase, ThumbIntermediateTip, ThumbTip],
            Finger::Index => [
                IndexFingerKnuckle,
                IndexFingerIntermediateBase,
                IndexFingerIntermediateTip,
                IndexFingerTip,
            ],
            Finger::Middle => [
                MiddleFingerKnuckle,
                MiddleFingerIntermediateBase,
                MiddleFingerIntermediateTip,
                MiddleFingerTip,
            ],
            Finger::Ring => [
                RingFingerKnuckle,
                RingFingerIntermediateBase,
                RingFingerIntermediateTip,
                RingFingerTip,
            ],
            Finger::Little => [
                LittleFingerKnuckle,
                LittleFingerIntermediateBase,
                LittleFingerIntermediateTip,
                LittleFingerTip,
            ],
        }
    }

    /// The thumb has no metacarpal joint.
    pub fn metacarpal(self) -> Option<JointName> {
        match self {
            Finger::Thumb => None,
            Finger::Index => Some(JointName::IndexFingerMetacarpal),
            Finger::Middle => Some(JointName::MiddleFingerMetacarpal),
            Finger::Ring => Some(JointName::RingFingerMetacarpal),
            Finger::Little => Some(JointName::LittleFingerMetacarpal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chirality {
    Left,
    #[default]
    Right,
}

/// One hand as reported by the tracking provider.
///
/// `joints` maps each tracked joint to its anchor-from-joint transform.
/// Untracked joints are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct HandAnchor {
    pub chirality: Chirality,
    pub joints: HashMap<JointName, Matrix4<f32>>,
}

impl HandAnchor {
    pub fn new(chirality: Chirality) -> Self {
        Self {
            chirality,
            joints: HashMap::new(),
        }
    }

    /// Position of `joint` in anchor space.
    pub fn local_position(&self, joint: JointName) -> Option<Vector3<f32>> {
        self.joints.get(&joint).map(|m| m.w.truncate())
    }

    /// `origin_from_anchor * anchor_from_joint * (0, 0, 0, 1)` for every joint.
    pub fn world_joint_positions(&self, origin_from_anchor: &Matrix4<f32>) -> JointPositions {
        let origin = Vector4::new(0.0, 0.0, 0.0, 1.0);
        JointPositions(
            self.joints
                .iter()
                .map(|(&name, anchor_from_joint)| {
                    let world = origin_from_anchor * anchor_from_joint * origin;
                    (name, world.truncate())
                })
                .collect(),
        )
    }
}

const FINGER_GUN_READY: &str = include_str!("../res/hands/finger_gun_ready.json");
const FINGER_GUN_FIRED: &str = include_str!("../res/hands/finger_gun_fired.json");

/// One joint of a [`RecordedHand`]. Transforms are column-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedJoint {
    pub name: JointName,
    #[serde(default = "tracked")]
    pub is_tracked: bool,
    pub transform: [[f32; 4]; 4],
}

fn tracked() -> bool {
    true
}

/// A hand skeleton captured from the tracking provider and stored as JSON.
///
/// `transform` is the origin-from-anchor pose at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedHand {
    pub chirality: Chirality,
    pub transform: [[f32; 4]; 4],
    pub joints: Vec<RecordedJoint>,
}

impl RecordedHand {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse recorded hand")
    }

    /// Right hand with thumb up and index finger pointing.
    pub fn finger_gun_ready() -> anyhow::Result<Self> {
        Self::from_json(FINGER_GUN_READY).context("Built-in finger gun ready pose")
    }

    /// The ready hand with the index finger pulled in.
    pub fn finger_gun_fired() -> anyhow::Result<Self> {
        Self::from_json(FINGER_GUN_FIRED).context("Built-in finger gun fired pose")
    }

    pub fn origin_from_anchor(&self) -> Matrix4<f32> {
        Matrix4::from(self.transform)
    }

    /// The recording as a live anchor. Untracked joints are left out.
    pub fn anchor(&self) -> HandAnchor {
        let mut hand = HandAnchor::new(self.chirality);
        hand.joints = self
            .joints
            .iter()
            .filter(|joint| joint.is_tracked)
            .map(|joint| (joint.name, Matrix4::from(joint.transform)))
            .collect();
        hand
    }
}

/// World-space joint positions of one hand for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointPositions(HashMap<JointName, Vector3<f32>>);

impl JointPositions {
    pub fn new(positions: HashMap<JointName, Vector3<f32>>) -> Self {
        Self(positions)
    }

    pub fn get(&self, joint: JointName) -> Option<Vector3<f32>> {
        self.0.get(&joint).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean of the index, middle and ring metacarpals.
    pub fn palm(&self) -> Option<Vector3<f32>> {
        let index = self.get(JointName::IndexFingerMetacarpal)?;
        let middle = self.get(JointName::MiddleFingerMetacarpal)?;
        let ring = self.get(JointName::RingFingerMetacarpal)?;
        Some((index + middle + ring) / 3.0)
    }

    /// Ray from the wrist through the palm, tilted down by `tilt`.
    ///
    /// The tilt is subtracted from the y component of the unit direction and
    /// the result is normalized again.
    pub fn aim_ray(&self, tilt: f32) -> Option<Ray> {
        let wrist = self.get(JointName::Wrist)?;
        let palm = self.palm()?;
        let towards_palm = palm - wrist;
        if towards_palm.magnitude2() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        let mut direction = towards_palm.normalize();
        direction.y -= tilt;
        Ray::new(wrist, direction)
    }
}

const KNUCKLE_OFFSET: f32 = 0.06;
const BONE_LENGTH: f32 = 0.03;
const CURL_PER_BONE: f32 = 1.4;

/// Builds an anchor-local right hand skeleton.
///
/// Fingers point along +X from a wrist at the origin and spread along Z,
/// thumb first. `curls[f]` bends each bone of finger `f` towards -Y; bone `k`
/// (counted from the knuckle) points `curl * 1.4 * (k + 1)` radians away from
/// +X, so a curl of 0 is a straight finger and 1 a fist.
pub fn synthetic_hand(curls: [f32; 5]) -> HandAnchor {
    let mut hand = HandAnchor::new(Chirality::Right);
    let mut put = |joint: JointName, position: Vector3<f32>| {
        hand.joints.insert(joint, Matrix4::from_translation(position));
    };
    put(JointName::Wrist, Vector3::new(0.0, 0.0, 0.0));
    put(JointName::ForearmWrist, Vector3::new(0.0, 0.0, 0.0));
    put(JointName::ForearmArm, Vector3::new(-0.25, 0.0, 0.0));

    for (finger, curl) in Finger::ALL.into_iter().zip(curls) {
        let (spread, knuckle_x) = match finger {
            Finger::Thumb => (0.04, 0.03),
            Finger::Index => (0.02, 0.03 + KNUCKLE_OFFSET),
            Finger::Middle => (0.0, 0.03 + KNUCKLE_OFFSET),
            Finger::Ring => (-0.02, 0.03 + KNUCKLE_OFFSET),
            Finger::Little => (-0.04, 0.03 + KNUCKLE_OFFSET),
        };
        if let Some(metacarpal) = finger.metacarpal() {
            put(metacarpal, Vector3::new(0.03, 0.0, spread));
        }
        let chain = finger.chain();
        let mut position = Vector3::new(knuckle_x, 0.0, spread);
        put(chain[0], position);
        for (k, &joint) in chain[1..].iter().enumerate() {
            let angle = curl.clamp(0.0, 1.0) * CURL_PER_BONE * (k as f32 + 1.0);
            position += Vector3::new(angle.cos(), -angle.sin(), 0.0) * BONE_LENGTH;
            put(joint, position);
        }
    }
    hand
}
