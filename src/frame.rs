//! Per-frame retarget loop
//!
//! Each tick takes the newest landmark bundle, retargets it onto the current
//! avatar and publishes the resulting pose. Bundles that arrive faster than
//! the loop runs are overwritten, never queued.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::avatar::PoseSnapshot;
use crate::landmarks::LandmarkBundle;
use crate::retarget::Retargeter;
use crate::AppState;

pub struct FrameLoop {
    state: Arc<AppState>,
    bundles: watch::Receiver<Option<LandmarkBundle>>,
    config_rx: watch::Receiver<u64>,
    retargeter: Retargeter,
    fps: u32,
    last_timestamp_ms: Option<f64>,
    was_active: bool,
    frame: u64,
}

impl FrameLoop {
    pub async fn new(state: Arc<AppState>) -> Self {
        let config = state.config.read().await;
        let retargeter = Retargeter::from_config(&config.retarget);
        let fps = config.render.fps.max(1);
        drop(config);

        let bundles = state.subscribe_bundles();
        let config_rx = state.subscribe_config();
        let was_active = state.is_tracking_active();

        Self {
            state,
            bundles,
            config_rx,
            retargeter,
            fps,
            last_timestamp_ms: None,
            was_active,
            frame: 0,
        }
    }

    /// Pick up retarget tuning changes.
    pub async fn reload_config(&mut self) {
        let config = self.state.config.read().await;
        self.retargeter = Retargeter::from_config(&config.retarget);
        tracing::debug!("Retarget settings reloaded: {:?}", self.retargeter);
    }

    pub fn retargeter(&self) -> &Retargeter {
        &self.retargeter
    }

    /// Whether `bundle` is newer than the last applied one. Bundles without a
    /// timestamp are always accepted.
    fn is_fresh(&self, bundle: &LandmarkBundle) -> bool {
        match (bundle.timestamp_ms, self.last_timestamp_ms) {
            (Some(ts), Some(last)) => ts > last,
            _ => true,
        }
    }

    /// Take the newest unseen bundle from the mailbox, if any.
    fn take_bundle(&mut self) -> Option<LandmarkBundle> {
        if !matches!(self.bundles.has_changed(), Ok(true)) {
            return None;
        }
        self.bundles.borrow_and_update().clone()
    }

    /// Run one frame. Returns the published snapshot, or `None` when no
    /// avatar is loaded.
    pub async fn tick(&mut self) -> Option<PoseSnapshot> {
        if matches!(self.config_rx.has_changed(), Ok(true)) {
            self.config_rx.borrow_and_update();
            self.reload_config().await;
        }

        self.frame += 1;
        self.state.stats.frames.fetch_add(1, Ordering::Relaxed);

        let active = self.state.is_tracking_active();
        if active && !self.was_active {
            // new engine runs restart their clock
            self.last_timestamp_ms = None;
        }
        self.was_active = active;

        let bundle = self.take_bundle().filter(|_| active);
        let bundle = match bundle {
            Some(b) if self.is_fresh(&b) => Some(b),
            Some(b) => {
                tracing::trace!(
                    "Dropping stale bundle {:?} (last {:?})",
                    b.timestamp_ms,
                    self.last_timestamp_ms
                );
                self.state.stats.stale.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => None,
        };

        let retargeter = self.retargeter;
        let frame = self.frame;
        let result = self
            .state
            .avatar
            .with_current(|avatar| {
                let applied = match &bundle {
                    Some(b) => {
                        retargeter.apply(b, avatar);
                        true
                    }
                    None => false,
                };
                (applied, avatar.snapshot(frame))
            })
            .await;

        let (applied, snapshot) = result?;

        if applied {
            if let Some(ts) = bundle.as_ref().and_then(|b| b.timestamp_ms) {
                self.last_timestamp_ms = Some(ts);
                *self.state.stats.last_timestamp_ms.write().await = Some(ts);
            }
            self.state.stats.applied.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Frame {} retargeted", frame);
        }

        self.state.publish_snapshot(snapshot.clone());
        Some(snapshot)
    }

    /// Tick at the configured rate until shutdown.
    pub async fn run(mut self) -> crate::Result<()> {
        let mut shutdown_rx = self.state.subscribe_shutdown();
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / self.fps as f64));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Frame loop started at {} fps", self.fps);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Frame loop shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
