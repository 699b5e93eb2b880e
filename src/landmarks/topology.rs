//! Fixed landmark topologies of the pose and hand landmarkers.

use std::ops::RangeInclusive;

/// The 33 body pose landmark indices.
///
/// Left/right refer to the subject, not to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    const ALL: [PoseLandmark; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Number of points in one detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// The five fingers in hand-landmark order.
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

    /// Position of this finger in [`Finger::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            Finger::Thumb => 0,
            Finger::Index => 1,
            Finger::Middle => 2,
            Finger::Ring => 3,
            Finger::Little => 4,
        }
    }

    /// The four hand-landmark indices this finger occupies, base to tip.
    pub fn landmark_range(self) -> RangeInclusive<usize> {
        let base = 1 + 4 * self.ordinal();
        base..=base + 3
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Little => "little",
        }
    }
}

/// The three driven joints of a finger, base to tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerJoint {
    Proximal,
    Intermediate,
    Distal,
}

impl FingerJoint {
    pub const ALL: [FingerJoint; 3] = [
        FingerJoint::Proximal,
        FingerJoint::Intermediate,
        FingerJoint::Distal,
    ];

    /// Offset of the joint's first point within its finger's landmark range.
    pub fn offset(self) -> usize {
        match self {
            FingerJoint::Proximal => 0,
            FingerJoint::Intermediate => 1,
            FingerJoint::Distal => 2,
        }
    }

    /// Hand-landmark indices of the segment `(from, to)` that drives this joint.
    pub fn segment(self, finger: Finger) -> (usize, usize) {
        let from = finger.landmark_range().start() + self.offset();
        (from, from + 1)
    }
}
