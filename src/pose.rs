//! Hand pose comparison.
//!
//! A [`HandPose`] is the anchor-local skeleton of a hand. Two poses are
//! compared finger by finger on the direction of each bone, so the score does
//! not depend on where the hand is in the world or how long the bones are.

use std::collections::HashMap;

use cgmath::{InnerSpace, Vector3};

use crate::hand::{Finger, HandAnchor, JointName, RecordedHand};

#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    joints: HashMap<JointName, Vector3<f32>>,
}

/// Result of [`HandPose::similarity`]; every score is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSimilarity {
    pub average: f32,
    /// Thumb, index, middle, ring, little.
    pub per_finger: [f32; 5],
}

impl HandPose {
    pub fn from_anchor(anchor: &HandAnchor) -> Self {
        Self {
            joints: anchor
                .joints
                .iter()
                .map(|(&name, m)| (name, m.w.truncate()))
                .collect(),
        }
    }

    pub fn from_local_positions(joints: HashMap<JointName, Vector3<f32>>) -> Self {
        Self { joints }
    }

    /// Thumb up, index pointing, the other fingers folded.
    pub fn finger_gun_ready() -> anyhow::Result<Self> {
        Ok(Self::from_anchor(&RecordedHand::finger_gun_ready()?.anchor()))
    }

    /// Like [`finger_gun_ready`](Self::finger_gun_ready) with the trigger finger pulled in.
    pub fn finger_gun_fired() -> anyhow::Result<Self> {
        Ok(Self::from_anchor(&RecordedHand::finger_gun_fired()?.anchor()))
    }

    fn bone_directions(&self, finger: Finger) -> Option<[Vector3<f32>; 3]> {
        let chain = finger.chain();
        let mut bones = [Vector3::new(0.0, 0.0, 0.0); 3];
        for (k, bone) in bones.iter_mut().enumerate() {
            let from = *self.joints.get(&chain[k])?;
            let to = *self.joints.get(&chain[k + 1])?;
            let along = to - from;
            *bone = if along.magnitude2() > 0.0 {
                along.normalize()
            } else {
                along
            };
        }
        Some(bones)
    }

    /// Five-finger similarity to `other`.
    ///
    /// Each bone scores `(dot(u, v) + 1) / 2` on its unit directions; a finger
    /// scores the mean of its bones and the average is taken over the fingers.
    /// Returns `None` if either pose is missing a joint.
    pub fn similarity(&self, other: &HandPose) -> Option<PoseSimilarity> {
        let mut per_finger = [0.0; 5];
        for (score, finger) in per_finger.iter_mut().zip(Finger::ALL) {
            let ours = self.bone_directions(finger)?;
            let theirs = other.bone_directions(finger)?;
            let total: f32 = ours
                .iter()
                .zip(theirs.iter())
                .map(|(u, v)| ((u.dot(*v) + 1.0) / 2.0).clamp(0.0, 1.0))
                .sum();
            *score = total / ours.len() as f32;
        }
        let average = per_finger.iter().sum::<f32>() / per_finger.len() as f32;
        Some(PoseSimilarity {
            average,
            per_finger,
        })
    }
}
