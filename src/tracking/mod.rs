//! Tracking module
//!
//! Transport from the external landmark engine:
//! - JSON-over-UDP bundle receiver
//! - Optional engine subprocess with crash restart

pub mod receiver;
pub mod subprocess;

pub use receiver::LandmarkReceiver;
pub use subprocess::{check_engine_available, EngineSubprocess};
