//! Configuration parsing and management for vtpuppet

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, VtPuppetError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub retarget: RetargetConfig,
    pub avatar: AvatarConfig,
    pub render: RenderConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VtPuppetError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, VtPuppetError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, VtPuppetError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), VtPuppetError> {
        if self.tracking.port == 0 {
            return Err(invalid("tracking.port", "Port must be greater than 0"));
        }

        if self.tracking.num_hands > 2 {
            return Err(invalid("tracking.num_hands", "At most two hands can be tracked"));
        }

        if self.tracking.auto_launch {
            let path = Path::new(&self.tracking.engine_script);
            if !path.exists() {
                tracing::warn!(
                    "Landmark engine auto_launch enabled but script not found at: {}",
                    self.tracking.engine_script
                );
            }
        }

        if !self.retarget.head_gain.is_finite() || self.retarget.head_gain <= 0.0 {
            return Err(invalid(
                "retarget.head_gain",
                "Head gain must be a positive finite number",
            ));
        }

        if self.render.fps == 0 {
            return Err(invalid("render.fps", "Frame rate must be greater than 0"));
        }

        if self.http.port == 0 {
            return Err(invalid("http.port", "Port must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> VtPuppetError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Landmark engine transport and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Start retargeting as soon as the service is up
    pub active_on_start: bool,
    /// UDP port the landmark engine sends bundles to
    pub port: u16,
    /// Listen address for the UDP socket
    pub listen_address: String,
    /// Launch the landmark engine helper as a subprocess
    pub auto_launch: bool,
    /// Path to the landmark engine helper script
    pub engine_script: String,
    /// Camera device index
    pub camera_device: u32,
    /// Camera capture width
    pub capture_width: u32,
    /// Camera capture height
    pub capture_height: u32,
    /// Camera capture FPS
    pub capture_fps: u32,
    /// Number of hands the engine should detect
    pub num_hands: u32,
    /// Directory where the engine caches its model files
    pub model_dir: String,
    /// Auto-restart subprocess on crash
    pub auto_restart: bool,
    /// Delay before restarting crashed subprocess (seconds)
    pub restart_delay_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            active_on_start: true,
            port: 12347,
            listen_address: "127.0.0.1".to_string(),
            auto_launch: false,
            engine_script: "scripts/landmark_engine.py".to_string(),
            camera_device: 0,
            capture_width: 1280,
            capture_height: 720,
            capture_fps: 30,
            num_hands: 2,
            model_dir: ".".to_string(),
            auto_restart: true,
            restart_delay_secs: 3,
        }
    }
}

/// Which parts of a landmark bundle get retargeted, and the head gain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Gain mapping normalized-image asymmetry to head yaw/pitch radians
    pub head_gain: f32,
    /// Drive expression channels from face blendshapes
    pub face: bool,
    /// Drive head and arm bones from the body pose
    pub pose: bool,
    /// Drive finger bones from hand landmarks
    pub hands: bool,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            head_gain: 3.0,
            face: true,
            pose: true,
            hands: true,
        }
    }
}

/// Avatar configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Rig manifest to load on startup; a full humanoid rig is used when unset
    pub model_path: Option<PathBuf>,
}

/// Frame cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frames per second for the retarget/publish loop
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("vtpuppet");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/vtpuppet");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/vtpuppet");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("vtpuppet");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retarget.head_gain, 3.0);
        assert!(config.retarget.face && config.retarget.pose && config.retarget.hands);
        assert_eq!(config.tracking.capture_width, 1280);
        assert_eq!(config.tracking.capture_height, 720);
        assert_eq!(config.tracking.num_hands, 2);
        assert_eq!(config.render.fps, 60);
        assert!(config.avatar.model_path.is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [retarget]
            head_gain = 2.5
            hands = false

            [avatar]
            model_path = "rigs/sample.toml"

            [render]
            fps = 30
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.retarget.head_gain, 2.5);
        assert!(!config.retarget.hands);
        assert!(config.retarget.face);
        assert_eq!(
            config.avatar.model_path.as_deref(),
            Some(Path::new("rigs/sample.toml"))
        );
        assert_eq!(config.render.fps, 30);
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_rejects_zero_fps() {
        let mut config = Config::default();
        config.render.fps = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("render.fps"));
    }

    #[test]
    fn test_rejects_non_positive_head_gain() {
        let mut config = Config::default();
        config.retarget.head_gain = 0.0;
        assert!(config.validate().is_err());

        config.retarget.head_gain = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = Config::from_str("[render]\nfps = \"fast\"").unwrap_err();
        assert!(matches!(
            err,
            VtPuppetError::Config(ConfigError::Parse(_))
        ));
    }
}
