//! Finger joint angles from hand landmarks.

use crate::avatar::{BodySide, Humanoid};
use crate::landmarks::{Finger, FingerJoint, Handedness, HandsRecord, LandmarkList};

/// Body side and angle sign for a handedness label.
///
/// The label is used as reported: "Right" drives the right hand with a
/// positive sign, "Left" the left hand with the sign flipped.
pub fn hand_side(handedness: Handedness) -> Option<(BodySide, f32)> {
    match handedness {
        Handedness::Right => Some((BodySide::Right, 1.0)),
        Handedness::Left => Some((BodySide::Left, -1.0)),
        Handedness::Unknown => None,
    }
}

/// 2D angle of the segment driving `joint` of `finger`, before the side sign.
pub fn finger_joint_angle(landmarks: &LandmarkList, finger: Finger, joint: FingerJoint) -> Option<f32> {
    let (from, to) = joint.segment(finger);
    let p1 = landmarks.get(from)?;
    let p2 = landmarks.get(to)?;
    Some((p2.y - p1.y).atan2(p2.x - p1.x))
}

/// Drive the finger bones of one hand. Missing bones and points are skipped,
/// as are joints with no bone of their own.
pub fn apply_hand(landmarks: &LandmarkList, side: BodySide, sign: f32, humanoid: &mut dyn Humanoid) {
    for finger in Finger::ALL {
        for joint in FingerJoint::ALL {
            let Some(bone) = side
                .finger_bone(finger, joint)
                .and_then(|bone| humanoid.bone_mut(bone))
            else {
                continue;
            };
            let Some(angle) = finger_joint_angle(landmarks, finger, joint) else {
                continue;
            };
            bone.z = angle * sign;
        }
    }
}

/// Drive every labelled hand in the record.
pub fn apply_hands(hands: &HandsRecord, humanoid: &mut dyn Humanoid) {
    for (landmarks, handedness) in hands.hands() {
        let Some((side, sign)) = hand_side(handedness) else {
            tracing::trace!("Skipping hand with unknown handedness");
            continue;
        };
        apply_hand(landmarks, side, sign, humanoid);
    }
}
