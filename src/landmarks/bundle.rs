//! Per-frame landmark detection results.
//!
//! Decoded from the JSON packets the landmark engine helper sends. Every
//! section is optional and a `null` point stands for a landmark the engine
//! did not report.

use serde::{Deserialize, Serialize};

use super::topology::PoseLandmark;

/// A landmark in normalized image coordinates (x, y in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth, scale roughly matches x
    #[serde(default)]
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }
}

/// A landmark in world space (meters, origin at the hips).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A normalized 2D point paired with its world-space position when available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoint {
    pub image: NormalizedLandmark,
    pub world: Option<WorldLandmark>,
}

/// A fixed-order landmark sequence with gaps for undetected points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkList(pub Vec<Option<NormalizedLandmark>>);

impl LandmarkList {
    pub fn get(&self, index: usize) -> Option<&NormalizedLandmark> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<NormalizedLandmark> for LandmarkList {
    fn from_iter<I: IntoIterator<Item = NormalizedLandmark>>(iter: I) -> Self {
        Self(iter.into_iter().map(Some).collect())
    }
}

/// World-space counterpart of [`LandmarkList`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldLandmarkList(pub Vec<Option<WorldLandmark>>);

impl WorldLandmarkList {
    pub fn get(&self, index: usize) -> Option<&WorldLandmark> {
        self.0.get(index).and_then(Option::as_ref)
    }
}

/// One blendshape category and its activation score (0.0 - 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendshapeCategory {
    pub category_name: String,
    pub score: f32,
}

impl BlendshapeCategory {
    pub fn new(category_name: &str, score: f32) -> Self {
        Self {
            category_name: category_name.to_string(),
            score,
        }
    }
}

/// Face landmarker output: blendshape scores for the tracked face.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceRecord {
    #[serde(default)]
    pub categories: Vec<BlendshapeCategory>,
}

/// Pose landmarker output. Only the first detected pose is retargeted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseRecord {
    #[serde(default)]
    pub landmarks: Vec<LandmarkList>,
    #[serde(default)]
    pub world_landmarks: Vec<WorldLandmarkList>,
}

impl PoseRecord {
    /// The first detected pose, if any.
    pub fn primary(&self) -> Option<&LandmarkList> {
        self.landmarks.first()
    }

    /// A landmark of the first pose paired with its world position.
    pub fn point(&self, landmark: PoseLandmark) -> Option<LandmarkPoint> {
        let image = *self.primary()?.get(landmark.index())?;
        let world = self
            .world_landmarks
            .first()
            .and_then(|list| list.get(landmark.index()))
            .copied();
        Some(LandmarkPoint { image, world })
    }
}

/// Handedness label reported by the hand landmarker.
///
/// The label names the subject's hand as the engine sees it through a
/// front-facing camera; retargeting uses it as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[serde(other)]
    Unknown,
}

/// Hand landmarker output: parallel landmark and handedness sequences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandsRecord {
    #[serde(default)]
    pub landmarks: Vec<LandmarkList>,
    #[serde(default)]
    pub handedness: Vec<Handedness>,
}

impl HandsRecord {
    /// Detected hands paired with their label. Hands without a label are dropped.
    pub fn hands(&self) -> impl Iterator<Item = (&LandmarkList, Handedness)> {
        self.landmarks
            .iter()
            .zip(self.handedness.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Everything the landmark engine detected in one video frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkBundle {
    /// Video frame timestamp in milliseconds (monotonic per engine run)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hands: Option<HandsRecord>,
}

impl LandmarkBundle {
    /// Parse a bundle from a JSON packet.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn with_timestamp(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_face(mut self, face: FaceRecord) -> Self {
        self.face = Some(face);
        self
    }

    pub fn with_pose(mut self, pose: PoseRecord) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_hands(mut self, hands: HandsRecord) -> Self {
        self.hands = Some(hands);
        self
    }

    /// True when no section carries anything to retarget.
    pub fn is_empty(&self) -> bool {
        let face_empty = self.face.as_ref().map_or(true, |f| f.categories.is_empty());
        let pose_empty = self.pose.as_ref().map_or(true, |p| p.primary().is_none());
        let hands_empty = self.hands.as_ref().map_or(true, HandsRecord::is_empty);
        face_empty && pose_empty && hands_empty
    }
}
