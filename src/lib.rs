//! VtPuppet - Headless avatar puppeteering service
//!
//! Drives a humanoid avatar from webcam landmark detections:
//! - Receives face/pose/hand landmark bundles from an external engine (UDP JSON)
//! - Retargets them onto bone rotations and expression weights
//! - Publishes per-frame pose snapshots to the renderer (HTTP/SSE)

pub mod avatar;
pub mod config;
pub mod error;
pub mod frame;
pub mod landmarks;
pub mod output;
pub mod retarget;
pub mod tracking;
pub mod web;

pub use config::Config;
pub use error::{Result, VtPuppetError};

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

use avatar::{AvatarSlot, PoseSnapshot, RigModel};
use landmarks::LandmarkBundle;

/// Frame loop counters
#[derive(Debug, Default)]
pub struct FrameStats {
    /// Ticks run
    pub frames: AtomicU64,
    /// Bundles retargeted onto the avatar
    pub applied: AtomicU64,
    /// Bundles dropped for a non-increasing timestamp
    pub stale: AtomicU64,
    /// Timestamp of the last applied bundle
    pub last_timestamp_ms: RwLock<Option<f64>>,
}

/// Application state shared across all components
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Current avatar
    pub avatar: AvatarSlot<RigModel>,
    /// Newest landmark bundle, overwritten on every receive
    pub bundle_tx: watch::Sender<Option<LandmarkBundle>>,
    /// Per-frame pose snapshots for the renderer
    pub snapshot_tx: broadcast::Sender<PoseSnapshot>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
    /// Whether incoming bundles are retargeted
    pub tracking_active: AtomicBool,
    /// Frame loop counters
    pub stats: FrameStats,
    /// Bumped on every config change
    pub config_version: watch::Sender<u64>,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (bundle_tx, _) = watch::channel(None);
        let (snapshot_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);
        let (config_version, _) = watch::channel(0);

        let tracking_active = config.tracking.active_on_start;

        Arc::new(Self {
            config: RwLock::new(config),
            avatar: AvatarSlot::new(),
            bundle_tx,
            snapshot_tx,
            shutdown_tx,
            tracking_active: AtomicBool::new(tracking_active),
            stats: FrameStats::default(),
            config_version,
        })
    }

    /// Load a rig manifest and make it the current avatar.
    ///
    /// A load started later wins; this one then fails with `Superseded`.
    pub async fn load_avatar<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.avatar.load_with(RigModel::load(path.as_ref())).await?;
        if let Some(name) = self.avatar.inspect(|a| a.name().to_string()).await {
            tracing::info!("Avatar '{}' attached", name);
        }
        Ok(())
    }

    /// Replace the current avatar with an already built one.
    pub async fn set_avatar(&self, avatar: RigModel) -> Result<()> {
        let ticket = self.avatar.begin_load();
        self.avatar.replace(ticket, avatar).await
    }

    /// Reset the current avatar's pose. Returns false when no avatar is loaded.
    pub async fn calibrate(&self) -> bool {
        let done = self
            .avatar
            .with_current(|avatar| retarget::calibrate(avatar))
            .await
            .is_some();
        if done {
            tracing::info!("Avatar calibrated");
        }
        done
    }

    /// Hand a freshly detected bundle to the frame loop.
    pub fn submit_bundle(&self, bundle: LandmarkBundle) {
        self.bundle_tx.send_replace(Some(bundle));
    }

    /// Subscribe to incoming landmark bundles
    pub fn subscribe_bundles(&self) -> watch::Receiver<Option<LandmarkBundle>> {
        self.bundle_tx.subscribe()
    }

    /// Publish a pose snapshot to all renderers
    pub fn publish_snapshot(&self, snapshot: PoseSnapshot) {
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Subscribe to pose snapshots
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<PoseSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Start or stop retargeting incoming bundles
    pub fn set_tracking_active(&self, active: bool) {
        let was = self.tracking_active.swap(active, Ordering::Relaxed);
        if was != active {
            tracing::info!("Tracking {}", if active { "started" } else { "stopped" });
        }
    }

    pub fn is_tracking_active(&self) -> bool {
        self.tracking_active.load(Ordering::Relaxed)
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Signal that config has changed. Subscribers see the new version
    /// whenever they next look, even if nobody is waiting right now.
    pub fn signal_config_changed(&self) {
        self.config_version.send_modify(|version| *version += 1);
    }

    /// Subscribe to config changes
    pub fn subscribe_config(&self) -> watch::Receiver<u64> {
        self.config_version.subscribe()
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::{Humanoid, HumanoidBone};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_state_follows_config() {
        let mut config = Config::default();
        config.tracking.active_on_start = false;
        let state = AppState::new(config);

        assert!(!state.is_tracking_active());
        assert!(!state.avatar.is_loaded().await);
        assert!(!state.calibrate().await);
    }

    #[tokio::test]
    async fn test_load_avatar_from_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rig.toml");
        std::fs::write(&path, "name = \"loaded\"\nbones = [\"head\"]\n").unwrap();

        let state = AppState::new(Config::default());
        state.load_avatar(&path).await.unwrap();

        let name = state.avatar.inspect(|a| a.name().to_string()).await;
        assert_eq!(name.as_deref(), Some("loaded"));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_current_avatar() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(Config::default());
        state.set_avatar(RigModel::full("kept")).await.unwrap();

        assert!(state.load_avatar(dir.path().join("nope.toml")).await.is_err());
        let name = state.avatar.inspect(|a| a.name().to_string()).await;
        assert_eq!(name.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_calibrate_resets_pose() {
        let state = AppState::new(Config::default());
        state.set_avatar(RigModel::full("c")).await.unwrap();
        state
            .avatar
            .with_current(|rig| {
                if let Some(head) = avatar::Avatar::humanoid(rig)
                    .and_then(|h| h.bone_mut(HumanoidBone::Head))
                {
                    head.set(0.3, 0.2, 0.1);
                }
            })
            .await;

        assert!(state.calibrate().await);
        let head_zero = state
            .avatar
            .inspect(|rig| {
                rig.humanoid_rig()
                    .and_then(|h| h.bone(HumanoidBone::Head))
                    .map(|r| r.is_zero())
            })
            .await
            .flatten();
        assert_eq!(head_zero, Some(true));
    }

    #[tokio::test]
    async fn test_submit_bundle_keeps_latest() {
        let state = AppState::new(Config::default());
        let rx = state.subscribe_bundles();

        state.submit_bundle(LandmarkBundle::default().with_timestamp(1.0));
        state.submit_bundle(LandmarkBundle::default().with_timestamp(2.0));

        let latest = rx.borrow().clone();
        assert_eq!(latest.and_then(|b| b.timestamp_ms), Some(2.0));
    }

    #[test]
    fn test_config_change_seen_without_waiter() {
        let state = AppState::new(Config::default());
        let mut rx = state.subscribe_config();
        assert!(!rx.has_changed().unwrap());

        state.signal_config_changed();
        state.signal_config_changed();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 2);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_tracking_toggle() {
        let state = AppState::new(Config::default());
        assert!(state.is_tracking_active());
        state.set_tracking_active(false);
        assert!(!state.is_tracking_active());
    }
}
