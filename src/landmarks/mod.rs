//! Landmark engine output model
//!
//! Pose/hand topologies and the per-frame detection bundle consumed by the
//! retargeting core.

pub mod bundle;
pub mod topology;

pub use bundle::{
    BlendshapeCategory, FaceRecord, Handedness, HandsRecord, LandmarkBundle, LandmarkList,
    LandmarkPoint, NormalizedLandmark, PoseRecord, WorldLandmark, WorldLandmarkList,
};
pub use topology::{Finger, FingerJoint, PoseLandmark, HAND_LANDMARK_COUNT};
