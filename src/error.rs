//! Error types for vtpuppet
//!
//! The retargeting core never returns errors: missing landmarks, bones or
//! expression channels are skipped in place. Everything here belongs to the
//! collaborators around it (config, avatar loading, landmark transport, HTTP).

use thiserror::Error;

/// Main error type for vtpuppet
#[derive(Error, Debug)]
pub enum VtPuppetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Avatar error: {0}")]
    Avatar(#[from] AvatarError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Avatar loading and replacement errors
#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("Failed to read rig manifest: {0}")]
    ManifestRead(String),

    #[error("Failed to parse rig manifest: {0}")]
    ManifestParse(String),

    #[error("Avatar load superseded by a newer request")]
    Superseded,
}

/// Landmark engine transport errors
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Landmark receiver error: {0}")]
    Receiver(String),

    #[error("Landmark packet parse error: {0}")]
    Parse(String),

    #[error("Landmark engine subprocess error: {0}")]
    Subprocess(String),
}

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    #[error("Server failed: {0}")]
    Serve(String),
}

/// Result type alias for vtpuppet operations
pub type Result<T> = std::result::Result<T, VtPuppetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_wraps_source() {
        let err: VtPuppetError = ConfigError::InvalidValue {
            field: "render.fps".to_string(),
            message: "must be greater than 0".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration value: render.fps - must be greater than 0"
        );
    }

    #[test]
    fn test_superseded_is_avatar_error() {
        let err: VtPuppetError = AvatarError::Superseded.into();
        assert!(matches!(err, VtPuppetError::Avatar(AvatarError::Superseded)));
    }
}
