//! Humanoid bone vocabulary and local bone rotations.

use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};

use crate::landmarks::{Finger, FingerJoint};

macro_rules! humanoid_bones {
    ($($variant:ident => $name:literal,)*) => {
        /// VRM 1.0 humanoid bone names.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum HumanoidBone {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl HumanoidBone {
            /// Every bone in the vocabulary, torso outwards.
            pub const ALL: &'static [HumanoidBone] = &[$(HumanoidBone::$variant,)*];

            /// Canonical bone name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(HumanoidBone::$variant => $name,)*
                }
            }

            /// Look up a bone by canonical name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(HumanoidBone::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

humanoid_bones! {
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",
    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",
    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",
    LeftThumbMetacarpal => "leftThumbMetacarpal",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",
    RightThumbMetacarpal => "rightThumbMetacarpal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl std::fmt::Display for HumanoidBone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the body a limb or hand belongs to (the subject's side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodySide {
    Left,
    Right,
}

impl BodySide {
    pub fn upper_arm(self) -> HumanoidBone {
        match self {
            BodySide::Left => HumanoidBone::LeftUpperArm,
            BodySide::Right => HumanoidBone::RightUpperArm,
        }
    }

    pub fn lower_arm(self) -> HumanoidBone {
        match self {
            BodySide::Left => HumanoidBone::LeftLowerArm,
            BodySide::Right => HumanoidBone::RightLowerArm,
        }
    }

    /// Bone driven by `joint` of `finger` on this side.
    ///
    /// Joints are matched to bones by name. The VRM 1.0 thumb has no
    /// intermediate bone, so that joint drives nothing, and the thumb
    /// metacarpal is never driven.
    pub fn finger_bone(self, finger: Finger, joint: FingerJoint) -> Option<HumanoidBone> {
        use FingerJoint::*;
        use HumanoidBone::*;

        let (left, right) = match (finger, joint) {
            (Finger::Thumb, Proximal) => (LeftThumbProximal, RightThumbProximal),
            (Finger::Thumb, Intermediate) => return None,
            (Finger::Thumb, Distal) => (LeftThumbDistal, RightThumbDistal),
            (Finger::Index, Proximal) => (LeftIndexProximal, RightIndexProximal),
            (Finger::Index, Intermediate) => (LeftIndexIntermediate, RightIndexIntermediate),
            (Finger::Index, Distal) => (LeftIndexDistal, RightIndexDistal),
            (Finger::Middle, Proximal) => (LeftMiddleProximal, RightMiddleProximal),
            (Finger::Middle, Intermediate) => (LeftMiddleIntermediate, RightMiddleIntermediate),
            (Finger::Middle, Distal) => (LeftMiddleDistal, RightMiddleDistal),
            (Finger::Ring, Proximal) => (LeftRingProximal, RightRingProximal),
            (Finger::Ring, Intermediate) => (LeftRingIntermediate, RightRingIntermediate),
            (Finger::Ring, Distal) => (LeftRingDistal, RightRingDistal),
            (Finger::Little, Proximal) => (LeftLittleProximal, RightLittleProximal),
            (Finger::Little, Intermediate) => (LeftLittleIntermediate, RightLittleIntermediate),
            (Finger::Little, Distal) => (LeftLittleDistal, RightLittleDistal),
        };

        Some(match self {
            BodySide::Left => left,
            BodySide::Right => right,
        })
    }
}

/// Bone local rotation as XYZ Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerRotation {
    /// The identity orientation
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn set(&mut self, x: f32, y: f32, z: f32) {
        *self = Self { x, y, z };
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.x, self.y, self.z)
    }
}
