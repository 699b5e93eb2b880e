//! Landmark engine subprocess manager
//!
//! Launches the Python landmark engine helper as a child process with
//! automatic cleanup on drop.

use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::config::TrackingConfig;
use crate::error::{TrackingError, VtPuppetError};

/// Manages the landmark engine subprocess (scripts/landmark_engine.py)
pub struct EngineSubprocess {
    child: Option<Child>,
    config: TrackingConfig,
    restart_at: Option<Instant>,
}

impl EngineSubprocess {
    /// Create a new subprocess manager (does not start the process)
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            child: None,
            config: config.clone(),
            restart_at: None,
        }
    }

    /// Command-line arguments passed to the helper script.
    pub fn args(&self) -> Vec<String> {
        let c = &self.config;
        vec![
            c.engine_script.clone(),
            "--ip".to_string(),
            c.listen_address.clone(),
            "--port".to_string(),
            c.port.to_string(),
            "--capture".to_string(),
            c.camera_device.to_string(),
            "--width".to_string(),
            c.capture_width.to_string(),
            "--height".to_string(),
            c.capture_height.to_string(),
            "--fps".to_string(),
            c.capture_fps.to_string(),
            "--num-hands".to_string(),
            c.num_hands.to_string(),
            "--model-dir".to_string(),
            c.model_dir.clone(),
        ]
    }

    /// Launch the landmark engine.
    pub fn start(&mut self) -> Result<(), VtPuppetError> {
        if self.is_running() {
            return Ok(());
        }

        let child = Command::new("python3")
            .args(self.args())
            .kill_on_drop(true)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                TrackingError::Subprocess(format!(
                    "Failed to launch landmark engine at '{}': {}",
                    self.config.engine_script, e
                ))
            })?;

        tracing::info!(
            "Landmark engine started (pid: {:?}, camera: {}, {}x{}@{}, port: {})",
            child.id(),
            self.config.camera_device,
            self.config.capture_width,
            self.config.capture_height,
            self.config.capture_fps,
            self.config.port,
        );

        self.child = Some(child);
        Ok(())
    }

    /// Check if the subprocess is still running (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::warn!("Landmark engine exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check landmark engine status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Whether an exited engine should be started again at `now`.
    ///
    /// The first check that finds the engine gone schedules the restart
    /// `restart_delay_secs` later; later checks return true once that
    /// deadline has passed. Never blocks.
    pub fn restart_due(&mut self, now: Instant) -> bool {
        if !self.config.auto_restart || self.is_running() {
            self.restart_at = None;
            return false;
        }

        let delay = self.config.restart_delay_secs;
        let at = *self.restart_at.get_or_insert_with(|| {
            tracing::info!("Landmark engine exited, restarting in {}s", delay);
            now + Duration::from_secs(delay)
        });
        if now < at {
            return false;
        }
        self.restart_at = None;
        true
    }

    /// Stop the subprocess by killing it
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping landmark engine (pid: {:?})", child.id());
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
    }
}

/// Check if the `mediapipe` Python package the engine relies on is available.
pub fn check_engine_available() -> bool {
    match std::process::Command::new("python3")
        .args(["-c", "import mediapipe"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}
