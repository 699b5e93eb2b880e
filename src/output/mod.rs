//! Output module
//!
//! Hands per-frame pose snapshots to the external renderer over
//! Server-Sent Events.

pub mod sse;
