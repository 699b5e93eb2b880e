//! Capabilities the retargeting core needs from a loaded avatar.

use super::bone::{EulerRotation, HumanoidBone};
use super::expression::ExpressionPreset;

/// Named-bone access on a humanoid rig.
pub trait Humanoid {
    /// Local rotation of `bone`, or `None` when the rig lacks it.
    fn bone(&self, bone: HumanoidBone) -> Option<&EulerRotation>;

    /// Mutable local rotation of `bone`, or `None` when the rig lacks it.
    fn bone_mut(&mut self, bone: HumanoidBone) -> Option<&mut EulerRotation>;

    /// Every bone this rig implements.
    fn bones(&self) -> Vec<HumanoidBone>;
}

/// Scalar expression weights addressed by preset.
pub trait ExpressionChannels {
    /// Current weight of `preset`, or `None` when the avatar lacks the channel.
    fn weight(&self, preset: ExpressionPreset) -> Option<f32>;

    /// Set the weight of `preset`. Returns false when the channel is missing.
    fn set_weight(&mut self, preset: ExpressionPreset, weight: f32) -> bool;
}

/// A loaded avatar. Either capability may be absent.
pub trait Avatar {
    fn humanoid(&mut self) -> Option<&mut dyn Humanoid>;

    fn expressions(&mut self) -> Option<&mut dyn ExpressionChannels>;
}
