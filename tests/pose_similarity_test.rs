use cgmath::{Deg, Matrix4, Vector3};
use spatial_ngin::{
    hand::{Chirality, Finger, JointName, RecordedHand, synthetic_hand},
    pose::HandPose,
};

use crate::common::test_utils::{EPSILON, assert_near, assert_vec_near, aiming_pose};

mod common;

#[test]
fn recorded_hands_load_every_joint() {
    let ready = RecordedHand::finger_gun_ready().unwrap();
    assert_eq!(ready.chirality, Chirality::Right);
    assert_eq!(ready.joints.len(), 27);
    assert!(ready.joints.iter().all(|joint| joint.is_tracked));

    let anchor = ready.anchor();
    assert_eq!(anchor.joints.len(), 27);
    assert_vec_near(
        anchor.local_position(JointName::Wrist).unwrap(),
        Vector3::new(0.0, 0.0, 0.0),
        EPSILON,
    );
    let origin = ready.origin_from_anchor();
    assert_vec_near(origin.w.truncate(), Vector3::new(0.119505, 1.058816, -0.3033591), EPSILON);
}

#[test]
fn untracked_joints_are_dropped() {
    let json = r#"{
        "chirality": "left",
        "transform": [[1,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]],
        "joints": [
            {"name": "wrist", "transform": [[1,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]]},
            {"name": "thumbTip", "isTracked": false, "transform": [[1,0,0,0],[0,1,0,0],[0,0,1,0],[0.1,0,0,1]]}
        ]
    }"#;
    let hand = RecordedHand::from_json(json).unwrap();
    assert_eq!(hand.chirality, Chirality::Left);
    let anchor = hand.anchor();
    assert!(anchor.joints.contains_key(&JointName::Wrist));
    assert!(!anchor.joints.contains_key(&JointName::ThumbTip));

    assert!(RecordedHand::from_json(r#"{"chirality": "right"}"#).is_err());
}

#[test]
fn identical_poses_score_one() {
    let pose = HandPose::finger_gun_ready().unwrap();
    let similarity = pose.similarity(&pose).unwrap();
    assert_near(similarity.average, 1.0, EPSILON);
    for score in similarity.per_finger {
        assert_near(score, 1.0, EPSILON);
    }
}

#[test]
fn fired_pose_differs_mostly_in_the_index_finger() {
    let ready = HandPose::finger_gun_ready().unwrap();
    let fired = HandPose::finger_gun_fired().unwrap();
    let similarity = ready.similarity(&fired).unwrap();

    assert_near(similarity.per_finger[0], 0.997, 1e-2);
    assert_near(similarity.per_finger[1], 0.329, 1e-2);
    assert_near(similarity.average, 0.825, 1e-2);
    // neither reference pose passes the other's threshold
    assert!(similarity.average < 0.9);
}

#[test]
fn flat_hand_is_no_finger_gun() {
    let open = HandPose::from_anchor(&synthetic_hand([0.0; 5]));
    let ready = HandPose::finger_gun_ready().unwrap();
    assert!(open.similarity(&ready).unwrap().average < 0.95);
}

#[test]
fn similarity_is_symmetric() {
    let a = HandPose::from_anchor(&synthetic_hand([0.2, 0.4, 0.6, 0.8, 1.0]));
    let b = HandPose::from_anchor(&synthetic_hand([0.9, 0.1, 0.0, 0.3, 0.5]));
    let ab = a.similarity(&b).unwrap();
    let ba = b.similarity(&a).unwrap();
    assert_near(ab.average, ba.average, EPSILON);
    assert!((0.0..=1.0).contains(&ab.average));
}

#[test]
fn missing_joint_yields_no_score() {
    let mut hand = synthetic_hand([0.0; 5]);
    hand.joints.remove(&JointName::IndexFingerTip);
    let partial = HandPose::from_anchor(&hand);
    let ready = HandPose::finger_gun_ready().unwrap();
    assert!(partial.similarity(&ready).is_none());
    assert!(ready.similarity(&partial).is_none());
}

#[test]
fn finger_chains_run_from_knuckle_to_tip() {
    assert_eq!(Finger::Index.chain()[3], JointName::IndexFingerTip);
    assert_eq!(Finger::Thumb.metacarpal(), None);
    assert_eq!(Finger::Little.metacarpal(), Some(JointName::LittleFingerMetacarpal));
    assert_eq!(JointName::ALL.len(), 27);
}

#[test]
fn world_positions_follow_the_anchor_pose() {
    let hand = synthetic_hand([0.0; 5]);
    let wrist = Vector3::new(0.5, 1.0, 0.0);
    let joints = hand.world_joint_positions(&aiming_pose(wrist));
    assert_eq!(joints.len(), hand.joints.len());
    assert_vec_near(joints.get(JointName::Wrist).unwrap(), wrist, EPSILON);
    assert_vec_near(
        joints.palm().unwrap(),
        wrist + Vector3::new(0.0, 0.0, -0.03),
        EPSILON,
    );
}

#[test]
fn aim_ray_points_from_wrist_through_palm() {
    let hand = synthetic_hand([0.0; 5]);
    let joints = hand.world_joint_positions(&Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0)));
    let ray = joints.aim_ray(0.0).unwrap();
    assert_vec_near(ray.origin, Vector3::new(0.0, 1.0, 0.0), EPSILON);
    assert_vec_near(ray.direction(), Vector3::new(1.0, 0.0, 0.0), EPSILON);

    let tilted = joints.aim_ray(0.1).unwrap();
    assert!(tilted.direction().y < 0.0);
    assert_near(cgmath::InnerSpace::magnitude(tilted.direction()), 1.0, EPSILON);

    let rotated = hand.world_joint_positions(&Matrix4::from_angle_z(Deg(90.0)));
    assert_vec_near(
        rotated.aim_ray(0.0).unwrap().direction(),
        Vector3::new(0.0, 1.0, 0.0),
        EPSILON,
    );
}

#[test]
fn aim_ray_needs_wrist_and_palm() {
    let mut hand = synthetic_hand([0.0; 5]);
    hand.joints.remove(&JointName::MiddleFingerMetacarpal);
    let joints = hand.world_joint_positions(&Matrix4::from_translation(Vector3::new(0.0, 0.0, 0.0)));
    assert!(joints.palm().is_none());
    assert!(joints.aim_ray(0.0).is_none());
}
