//! Avatar model module
//!
//! Bone and expression vocabularies, the capability traits retargeting writes
//! through, the in-memory rig and the current-avatar slot.

pub mod bone;
pub mod expression;
pub mod model;
pub mod rig;
pub mod slot;

pub use bone::{BodySide, EulerRotation, HumanoidBone};
pub use expression::ExpressionPreset;
pub use model::{Avatar, ExpressionChannels, Humanoid};
pub use rig::{ExpressionSet, HumanoidRig, PoseSnapshot, RigManifest, RigModel};
pub use slot::{AvatarSlot, LoadTicket};
