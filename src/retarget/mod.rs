//! Landmark → avatar retargeting
//!
//! Converts one landmark bundle into bone rotations and expression weights
//! on the current avatar. Each frame overwrites what it drives; nothing is
//! carried between frames apart from the avatar's own values. Missing data
//! never fails a pass, it only narrows what gets written.

pub mod face;
pub mod hands;
pub mod pose;

pub use face::{expression_for_category, FACE_EXPRESSION_MAP};
pub use hands::{finger_joint_angle, hand_side};
pub use pose::{arm_angles, head_angles, ArmAngles, HeadAngles, DEFAULT_HEAD_GAIN};

use crate::avatar::{Avatar, EulerRotation, HumanoidBone};
use crate::config::RetargetConfig;
use crate::landmarks::LandmarkBundle;

/// Retargeting pass with its tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retargeter {
    pub head_gain: f32,
    pub face: bool,
    pub pose: bool,
    pub hands: bool,
}

impl Default for Retargeter {
    fn default() -> Self {
        Self {
            head_gain: DEFAULT_HEAD_GAIN,
            face: true,
            pose: true,
            hands: true,
        }
    }
}

impl Retargeter {
    pub fn from_config(config: &RetargetConfig) -> Self {
        Self {
            head_gain: config.head_gain,
            face: config.face,
            pose: config.pose,
            hands: config.hands,
        }
    }

    /// Apply one bundle to `avatar`.
    ///
    /// Face, pose and hands are independent: a missing capability or section
    /// skips only its own step.
    pub fn apply<A: Avatar + ?Sized>(&self, bundle: &LandmarkBundle, avatar: &mut A) {
        if self.face {
            if let Some(face) = bundle.face.as_ref().filter(|f| !f.categories.is_empty()) {
                if let Some(expressions) = avatar.expressions() {
                    face::apply_face(face, expressions);
                }
            }
        }

        let Some(humanoid) = avatar.humanoid() else {
            return;
        };

        if self.pose {
            if let Some(landmarks) = bundle.pose.as_ref().and_then(|p| p.primary()) {
                pose::apply_pose(landmarks, humanoid, self.head_gain);
            }
        }

        if self.hands {
            if let Some(hands) = bundle.hands.as_ref().filter(|h| !h.is_empty()) {
                hands::apply_hands(hands, humanoid);
            }
        }
    }
}

/// Retarget with default tuning.
pub fn retarget<A: Avatar + ?Sized>(bundle: &LandmarkBundle, avatar: &mut A) {
    Retargeter::default().apply(bundle, avatar);
}

/// Reset every bone of the avatar's humanoid to the identity rotation.
/// No-op when the avatar has no humanoid.
pub fn calibrate<A: Avatar + ?Sized>(avatar: &mut A) {
    let Some(humanoid) = avatar.humanoid() else {
        return;
    };

    for bone in humanoid.bones() {
        if let Some(rotation) = humanoid.bone_mut(bone) {
            *rotation = EulerRotation::ZERO;
        }
    }

    if let Some(head) = humanoid.bone_mut(HumanoidBone::Head) {
        *head = EulerRotation::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::{ExpressionPreset, RigModel};
    use crate::landmarks::{
        BlendshapeCategory, FaceRecord, Handedness, HandsRecord, LandmarkList,
        NormalizedLandmark, PoseLandmark, PoseRecord, HAND_LANDMARK_COUNT,
    };
    use serde_json::json;

    fn full_bundle() -> LandmarkBundle {
        let mut pose = vec![None; PoseLandmark::COUNT];
        for (landmark, x, y) in [
            (PoseLandmark::Nose, 0.5, 0.3),
            (PoseLandmark::LeftEar, 0.6, 0.28),
            (PoseLandmark::RightEar, 0.4, 0.3),
            (PoseLandmark::LeftShoulder, 0.65, 0.5),
            (PoseLandmark::LeftElbow, 0.75, 0.6),
            (PoseLandmark::LeftWrist, 0.8, 0.5),
            (PoseLandmark::RightShoulder, 0.35, 0.5),
            (PoseLandmark::RightElbow, 0.25, 0.6),
        ] {
            pose[landmark.index()] = Some(NormalizedLandmark::new(x, y));
        }

        let hand: LandmarkList = (0..HAND_LANDMARK_COUNT)
            .map(|i| NormalizedLandmark::new(0.5 + 0.01 * i as f32, 0.5 - 0.002 * (i * i) as f32))
            .collect();

        LandmarkBundle::default()
            .with_timestamp(33.0)
            .with_face(FaceRecord {
                categories: vec![
                    BlendshapeCategory::new("jawOpen", 0.6),
                    BlendshapeCategory::new("eyeBlinkLeft", 0.9),
                ],
            })
            .with_pose(PoseRecord {
                landmarks: vec![LandmarkList(pose)],
                world_landmarks: Vec::new(),
            })
            .with_hands(HandsRecord {
                landmarks: vec![hand],
                handedness: vec![Handedness::Right],
            })
    }

    fn weight(rig: &RigModel, preset: ExpressionPreset) -> f32 {
        rig.expression_set()
            .and_then(|set| set.iter().find(|(p, _)| *p == preset))
            .map(|(_, w)| w)
            .unwrap()
    }

    fn bone(rig: &RigModel, bone: HumanoidBone) -> EulerRotation {
        rig.humanoid_rig()
            .and_then(|h| h.iter().find(|(b, _)| *b == bone))
            .map(|(_, r)| *r)
            .unwrap()
    }

    #[test]
    fn test_full_bundle_drives_everything() {
        let mut rig = RigModel::full("test");
        retarget(&full_bundle(), &mut rig);

        assert_eq!(weight(&rig, ExpressionPreset::Aa), 0.6);
        assert_eq!(weight(&rig, ExpressionPreset::BlinkLeft), 0.9);
        assert!(!bone(&rig, HumanoidBone::Head).is_zero());
        assert!(!bone(&rig, HumanoidBone::LeftUpperArm).is_zero());
        assert!(!bone(&rig, HumanoidBone::RightUpperArm).is_zero());
        assert!(!bone(&rig, HumanoidBone::RightIndexProximal).is_zero());
        assert!(bone(&rig, HumanoidBone::LeftIndexProximal).is_zero());
    }

    #[test]
    fn test_empty_bundle_is_full_noop() {
        let mut rig = RigModel::full("test");
        retarget(&full_bundle(), &mut rig);
        let before = rig.clone();

        retarget(&LandmarkBundle::default(), &mut rig);
        assert_eq!(rig, before);

        let empty_sections = LandmarkBundle::default()
            .with_face(FaceRecord::default())
            .with_pose(PoseRecord::default())
            .with_hands(HandsRecord::default());
        retarget(&empty_sections, &mut rig);
        assert_eq!(rig, before);
    }

    #[test]
    fn test_no_face_leaves_expressions() {
        let mut rig = RigModel::full("test");
        retarget(&full_bundle(), &mut rig);
        let expressions = rig.expression_set().cloned();

        let mut bundle = full_bundle();
        bundle.face = None;
        retarget(&bundle, &mut rig);
        assert_eq!(rig.expression_set().cloned(), expressions);
    }

    #[test]
    fn test_stale_expressions_persist_when_face_drops() {
        let mut rig = RigModel::full("test");
        retarget(&full_bundle(), &mut rig);

        let mut lost_face = full_bundle();
        lost_face.face = None;
        for _ in 0..10 {
            retarget(&lost_face, &mut rig);
        }

        // No decay toward neutral: the last detected weight stays put.
        assert_eq!(weight(&rig, ExpressionPreset::Aa), 0.6);
    }

    #[test]
    fn test_rotations_overwrite_not_accumulate() {
        let mut once = RigModel::full("once");
        let mut thrice = RigModel::full("thrice");
        retarget(&full_bundle(), &mut once);
        for _ in 0..3 {
            retarget(&full_bundle(), &mut thrice);
        }
        assert_eq!(once.snapshot(0).bones, thrice.snapshot(0).bones);
    }

    #[test]
    fn test_face_without_humanoid() {
        let mut rig = RigModel::new(
            "face-only",
            None,
            Some(crate::avatar::ExpressionSet::new(ExpressionPreset::ALL)),
        );
        retarget(&full_bundle(), &mut rig);
        assert_eq!(weight(&rig, ExpressionPreset::Aa), 0.6);
    }

    #[test]
    fn test_disabled_sections_ignored() {
        let retargeter = Retargeter {
            face: false,
            hands: false,
            ..Retargeter::default()
        };
        let mut rig = RigModel::full("test");
        retargeter.apply(&full_bundle(), &mut rig);

        assert_eq!(weight(&rig, ExpressionPreset::Aa), 0.0);
        assert!(bone(&rig, HumanoidBone::RightIndexProximal).is_zero());
        assert!(!bone(&rig, HumanoidBone::Head).is_zero());
    }

    #[test]
    fn test_calibrate_zeroes_every_bone() {
        let mut rig = RigModel::full("test");
        retarget(&full_bundle(), &mut rig);
        calibrate(&mut rig);

        assert!(rig.humanoid_rig().unwrap().iter().all(|(_, r)| r.is_zero()));
        // expressions are not part of the pose reset
        assert_eq!(weight(&rig, ExpressionPreset::Aa), 0.6);
    }

    #[test]
    fn test_calibrate_without_humanoid() {
        let mut rig = RigModel::new("empty", None, None);
        calibrate(&mut rig);
        assert_eq!(rig, RigModel::new("empty", None, None));
    }

    #[test]
    fn test_bundle_from_engine_json() {
        let mut pose = vec![serde_json::Value::Null; PoseLandmark::COUNT];
        pose[0] = json!({"x": 0.5, "y": 0.3});
        pose[7] = json!({"x": 0.6, "y": 0.3});
        pose[8] = json!({"x": 0.4, "y": 0.3});

        let packet = json!({
            "timestamp_ms": 100.0,
            "face": {"categories": [{"category_name": "mouthPucker", "score": 0.5}]},
            "pose": {"landmarks": [pose]},
        });
        let bundle = LandmarkBundle::from_json(packet.to_string().as_bytes()).unwrap();

        let mut rig = RigModel::full("json");
        retarget(&bundle, &mut rig);

        assert_eq!(weight(&rig, ExpressionPreset::Ou), 0.5);
        let head = bone(&rig, HumanoidBone::Head);
        assert!(head.x.abs() < 1e-6 && head.y.abs() < 1e-6 && head.z.abs() < 1e-6);
    }

    #[test]
    fn test_retargeter_from_config() {
        let config = RetargetConfig {
            head_gain: 2.0,
            face: true,
            pose: false,
            hands: true,
        };
        let retargeter = Retargeter::from_config(&config);
        assert_eq!(retargeter.head_gain, 2.0);
        assert!(!retargeter.pose);
    }
}
