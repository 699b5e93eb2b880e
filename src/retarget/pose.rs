//! Head and arm orientation from body pose landmarks.
//!
//! Angles come from 2D deltas in normalized image coordinates (y grows
//! downwards). Each driven bone gets an absolute overwrite on the axes listed
//! here; other axes are left alone.

use std::f32::consts::PI;

use crate::avatar::{BodySide, Humanoid, HumanoidBone};
use crate::landmarks::{LandmarkList, NormalizedLandmark, PoseLandmark};

/// Default empirical gain mapping head asymmetry deltas to radians.
pub const DEFAULT_HEAD_GAIN: f32 = 3.0;

/// Shoulder, elbow and wrist landmarks per side.
const ARM_LANDMARKS: &[(BodySide, PoseLandmark, PoseLandmark, PoseLandmark)] = &[
    (
        BodySide::Left,
        PoseLandmark::LeftShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::LeftWrist,
    ),
    (
        BodySide::Right,
        PoseLandmark::RightShoulder,
        PoseLandmark::RightElbow,
        PoseLandmark::RightWrist,
    ),
];

/// Head rotation proxies in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Head orientation from nose tip and both ears.
pub fn head_angles(
    nose: &NormalizedLandmark,
    left_ear: &NormalizedLandmark,
    right_ear: &NormalizedLandmark,
    gain: f32,
) -> HeadAngles {
    let roll = (left_ear.y - right_ear.y).atan2(left_ear.x - right_ear.x);

    let left_dist = (nose.x - left_ear.x).abs();
    let right_dist = (nose.x - right_ear.x).abs();
    let yaw = (left_dist - right_dist) * gain;

    let ears_y = (left_ear.y + right_ear.y) / 2.0;
    let pitch = (ears_y - nose.y) * gain;

    HeadAngles { pitch, yaw, roll }
}

/// Absolute segment angles of one arm in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArmAngles {
    /// Shoulder → elbow
    pub upper: f32,
    /// Elbow → wrist; equals `upper` when the wrist is missing
    pub lower: f32,
}

impl ArmAngles {
    /// Upper-arm z rotation, offset by the side's rest direction.
    pub fn upper_rotation(&self, side: BodySide) -> f32 {
        match side {
            BodySide::Left => self.upper,
            BodySide::Right => self.upper - PI,
        }
    }

    /// Forearm z rotation relative to the upper arm.
    pub fn lower_rotation(&self) -> f32 {
        self.lower - self.upper
    }
}

pub fn arm_angles(
    shoulder: &NormalizedLandmark,
    elbow: &NormalizedLandmark,
    wrist: Option<&NormalizedLandmark>,
) -> ArmAngles {
    let dx_upper = elbow.x - shoulder.x;
    let dy_upper = elbow.y - shoulder.y;
    let upper = dy_upper.atan2(dx_upper);

    let (dx_lower, dy_lower) = match wrist {
        Some(wrist) => (wrist.x - elbow.x, wrist.y - elbow.y),
        None => (dx_upper, dy_upper),
    };
    let lower = dy_lower.atan2(dx_lower);

    ArmAngles { upper, lower }
}

/// Drive the head bone. Skipped when the bone or any of the three landmarks
/// is missing.
pub fn apply_head(landmarks: &LandmarkList, humanoid: &mut dyn Humanoid, gain: f32) {
    let (Some(nose), Some(left_ear), Some(right_ear)) = (
        landmarks.get(PoseLandmark::Nose.index()),
        landmarks.get(PoseLandmark::LeftEar.index()),
        landmarks.get(PoseLandmark::RightEar.index()),
    ) else {
        return;
    };

    let Some(head) = humanoid.bone_mut(HumanoidBone::Head) else {
        return;
    };

    let angles = head_angles(nose, left_ear, right_ear, gain);
    head.set(angles.pitch, angles.yaw, angles.roll);
}

/// Drive one arm. Skipped when the upper-arm bone, shoulder or elbow is missing.
pub fn apply_arm(
    landmarks: &LandmarkList,
    humanoid: &mut dyn Humanoid,
    side: BodySide,
    shoulder: PoseLandmark,
    elbow: PoseLandmark,
    wrist: PoseLandmark,
) {
    let (Some(shoulder), Some(elbow)) = (
        landmarks.get(shoulder.index()),
        landmarks.get(elbow.index()),
    ) else {
        return;
    };

    let angles = arm_angles(shoulder, elbow, landmarks.get(wrist.index()));

    let Some(upper_arm) = humanoid.bone_mut(side.upper_arm()) else {
        return;
    };
    upper_arm.z = angles.upper_rotation(side);

    if let Some(lower_arm) = humanoid.bone_mut(side.lower_arm()) {
        lower_arm.z = angles.lower_rotation();
    }
}

/// Head then both arms from the primary pose.
pub fn apply_pose(landmarks: &LandmarkList, humanoid: &mut dyn Humanoid, head_gain: f32) {
    apply_head(landmarks, humanoid, head_gain);

    for &(side, shoulder, elbow, wrist) in ARM_LANDMARKS {
        apply_arm(landmarks, humanoid, side, shoulder, elbow, wrist);
    }
}
