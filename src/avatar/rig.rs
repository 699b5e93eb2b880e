//! In-memory humanoid rig driven by the retargeting core.
//!
//! A [`RigModel`] is built from a small manifest naming the bones and
//! expression channels an avatar implements. Mesh and skeleton data stay
//! with the external renderer; the rig only carries the values retargeting
//! writes and the renderer reads back through [`PoseSnapshot`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::bone::{EulerRotation, HumanoidBone};
use super::expression::ExpressionPreset;
use super::model::{Avatar, ExpressionChannels, Humanoid};
use crate::error::{AvatarError, VtPuppetError};

/// Declares which bones and expression channels a rig implements.
///
/// Omitting `bones` yields an avatar without a humanoid; omitting
/// `expressions` yields one without expression channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigManifest {
    pub name: String,
    #[serde(default)]
    pub bones: Option<Vec<String>>,
    #[serde(default)]
    pub expressions: Option<Vec<String>>,
}

impl RigManifest {
    /// Read a manifest from disk. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, VtPuppetError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AvatarError::ManifestRead(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let manifest = if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| AvatarError::ManifestParse(format!("{}: {}", path.display(), e)))?
        } else {
            toml::from_str(&contents)
                .map_err(|e| AvatarError::ManifestParse(format!("{}: {}", path.display(), e)))?
        };

        Ok(manifest)
    }
}

/// Bone rotations of a humanoid rig.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HumanoidRig {
    bones: BTreeMap<HumanoidBone, EulerRotation>,
}

impl HumanoidRig {
    pub fn new(bones: impl IntoIterator<Item = HumanoidBone>) -> Self {
        Self {
            bones: bones
                .into_iter()
                .map(|bone| (bone, EulerRotation::ZERO))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanoidBone, &EulerRotation)> {
        self.bones.iter().map(|(bone, rot)| (*bone, rot))
    }
}

impl Humanoid for HumanoidRig {
    fn bone(&self, bone: HumanoidBone) -> Option<&EulerRotation> {
        self.bones.get(&bone)
    }

    fn bone_mut(&mut self, bone: HumanoidBone) -> Option<&mut EulerRotation> {
        self.bones.get_mut(&bone)
    }

    fn bones(&self) -> Vec<HumanoidBone> {
        self.bones.keys().copied().collect()
    }
}

/// Expression weights of an avatar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionSet {
    weights: BTreeMap<ExpressionPreset, f32>,
}

impl ExpressionSet {
    pub fn new(presets: impl IntoIterator<Item = ExpressionPreset>) -> Self {
        Self {
            weights: presets.into_iter().map(|p| (p, 0.0)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExpressionPreset, f32)> + '_ {
        self.weights.iter().map(|(preset, weight)| (*preset, *weight))
    }
}

impl ExpressionChannels for ExpressionSet {
    fn weight(&self, preset: ExpressionPreset) -> Option<f32> {
        self.weights.get(&preset).copied()
    }

    fn set_weight(&mut self, preset: ExpressionPreset, weight: f32) -> bool {
        match self.weights.get_mut(&preset) {
            Some(slot) => {
                *slot = weight;
                true
            }
            None => false,
        }
    }
}

/// A loaded avatar: optional humanoid plus optional expression channels.
#[derive(Debug, Clone, PartialEq)]
pub struct RigModel {
    name: String,
    humanoid: Option<HumanoidRig>,
    expressions: Option<ExpressionSet>,
}

impl RigModel {
    pub fn new(
        name: &str,
        humanoid: Option<HumanoidRig>,
        expressions: Option<ExpressionSet>,
    ) -> Self {
        Self {
            name: name.to_string(),
            humanoid,
            expressions,
        }
    }

    /// A rig implementing every humanoid bone and every preset expression.
    pub fn full(name: &str) -> Self {
        Self::new(
            name,
            Some(HumanoidRig::new(HumanoidBone::ALL.iter().copied())),
            Some(ExpressionSet::new(ExpressionPreset::ALL)),
        )
    }

    /// Build a rig from a manifest. Unknown bone or expression names are
    /// logged and skipped.
    pub fn from_manifest(manifest: &RigManifest) -> Self {
        let humanoid = manifest.bones.as_ref().map(|names| {
            HumanoidRig::new(names.iter().filter_map(|name| {
                let bone = HumanoidBone::from_name(name);
                if bone.is_none() {
                    tracing::warn!("Rig '{}': unknown humanoid bone '{}'", manifest.name, name);
                }
                bone
            }))
        });

        let expressions = manifest.expressions.as_ref().map(|names| {
            ExpressionSet::new(names.iter().filter_map(|name| {
                let preset = ExpressionPreset::from_name(name);
                if preset.is_none() {
                    tracing::warn!("Rig '{}': unknown expression '{}'", manifest.name, name);
                }
                preset
            }))
        });

        Self::new(&manifest.name, humanoid, expressions)
    }

    /// Load a manifest from disk and build the rig.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, VtPuppetError> {
        let manifest = RigManifest::load(path.as_ref()).await?;
        let rig = Self::from_manifest(&manifest);

        tracing::info!(
            "Loaded rig '{}' ({} bones, {} expressions)",
            rig.name,
            rig.humanoid.as_ref().map_or(0, HumanoidRig::len),
            rig.expressions.as_ref().map_or(0, |e| e.weights.len()),
        );

        Ok(rig)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn humanoid_rig(&self) -> Option<&HumanoidRig> {
        self.humanoid.as_ref()
    }

    pub fn expression_set(&self) -> Option<&ExpressionSet> {
        self.expressions.as_ref()
    }

    /// Copy the current pose for the renderer.
    pub fn snapshot(&self, frame: u64) -> PoseSnapshot {
        let bones = self
            .humanoid
            .iter()
            .flat_map(|h| h.iter())
            .map(|(bone, rot)| (bone.as_str().to_string(), rot.to_quat().to_array()))
            .collect();

        let expressions = self
            .expressions
            .iter()
            .flat_map(|e| e.iter())
            .map(|(preset, weight)| (preset.as_str().to_string(), weight))
            .collect();

        PoseSnapshot {
            frame,
            avatar: self.name.clone(),
            bones,
            expressions,
        }
    }
}

impl Avatar for RigModel {
    fn humanoid(&mut self) -> Option<&mut dyn Humanoid> {
        self.humanoid.as_mut().map(|h| h as &mut dyn Humanoid)
    }

    fn expressions(&mut self) -> Option<&mut dyn ExpressionChannels> {
        self.expressions
            .as_mut()
            .map(|e| e as &mut dyn ExpressionChannels)
    }
}

/// Per-frame pose handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    /// Frame counter of the loop that produced this snapshot
    pub frame: u64,
    /// Name of the avatar the pose belongs to
    pub avatar: String,
    /// Bone name → local rotation quaternion [x, y, z, w]
    pub bones: BTreeMap<String, [f32; 4]>,
    /// Expression name → weight
    pub expressions: BTreeMap<String, f32>,
}
