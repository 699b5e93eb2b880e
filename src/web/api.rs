//! REST API endpoints

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::config::Config;
use crate::output::sse;
use crate::AppState;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    pub fn failure(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Json<Self> {
        Self::failure(message)
    }

    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
        })
    }
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub tracking_active: bool,
    pub avatar: Option<String>,
    pub frames: u64,
    pub applied: u64,
    pub stale: u64,
    pub last_timestamp_ms: Option<f64>,
}

/// Get current status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatusResponse>> {
    let avatar = state.avatar.inspect(|a| a.name().to_string()).await;
    let last_timestamp_ms = *state.stats.last_timestamp_ms.read().await;

    ApiResponse::success(StatusResponse {
        version: crate::VERSION.to_string(),
        tracking_active: state.is_tracking_active(),
        avatar,
        frames: state.stats.frames.load(Ordering::Relaxed),
        applied: state.stats.applied.load(Ordering::Relaxed),
        stale: state.stats.stale.load(Ordering::Relaxed),
        last_timestamp_ms,
    })
}

/// Tracking toggle response
#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub active: bool,
}

pub async fn start_tracking(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<TrackingResponse>> {
    state.set_tracking_active(true);
    ApiResponse::success(TrackingResponse { active: true })
}

pub async fn stop_tracking(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<TrackingResponse>> {
    state.set_tracking_active(false);
    ApiResponse::success(TrackingResponse { active: false })
}

/// Reset the avatar pose
pub async fn calibrate(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    if state.calibrate().await {
        ApiResponse::<()>::ok()
    } else {
        ApiResponse::<()>::error("No avatar loaded")
    }
}

/// Load avatar request
#[derive(Debug, Deserialize)]
pub struct LoadAvatarRequest {
    pub path: PathBuf,
}

/// Load avatar response
#[derive(Debug, Serialize)]
pub struct LoadAvatarResponse {
    pub avatar: String,
}

/// Load a rig manifest and replace the current avatar
pub async fn load_avatar(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadAvatarRequest>,
) -> Json<ApiResponse<LoadAvatarResponse>> {
    if let Err(e) = state.load_avatar(&request.path).await {
        tracing::warn!("Avatar load from {} failed: {}", request.path.display(), e);
        return ApiResponse::failure(&e.to_string());
    }

    match state.avatar.inspect(|a| a.name().to_string()).await {
        Some(avatar) => ApiResponse::success(LoadAvatarResponse { avatar }),
        None => ApiResponse::failure("No avatar loaded"),
    }
}

/// Get current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    let config = state.config.read().await;
    Json(config.clone())
}

/// Update retarget settings
#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub head_gain: Option<f32>,
    #[serde(default)]
    pub face: Option<bool>,
    #[serde(default)]
    pub pose: Option<bool>,
    #[serde(default)]
    pub hands: Option<bool>,
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Json<ApiResponse<()>> {
    let mut config = state.config.write().await;

    let mut updated = config.clone();
    if let Some(gain) = update.head_gain {
        updated.retarget.head_gain = gain;
    }
    if let Some(face) = update.face {
        updated.retarget.face = face;
    }
    if let Some(pose) = update.pose {
        updated.retarget.pose = pose;
    }
    if let Some(hands) = update.hands {
        updated.retarget.hands = hands;
    }

    if let Err(e) = updated.validate() {
        return ApiResponse::<()>::error(&e.to_string());
    }

    *config = updated;
    drop(config);

    // Signal config change
    state.signal_config_changed();

    ApiResponse::<()>::ok()
}

/// SSE stream endpoint
pub async fn pose_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse::create_pose_stream(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::RigModel;
    use tempfile::TempDir;

    fn state() -> Arc<AppState> {
        AppState::new(Config::default())
    }

    #[tokio::test]
    async fn test_status_without_avatar() {
        let Json(response) = get_status(State(state())).await;
        let status = response.data.unwrap();
        assert!(status.tracking_active);
        assert_eq!(status.avatar, None);
        assert_eq!(status.frames, 0);
        assert_eq!(status.version, crate::VERSION);
    }

    #[tokio::test]
    async fn test_tracking_toggle() {
        let state = state();
        let Json(response) = stop_tracking(State(Arc::clone(&state))).await;
        assert!(!response.data.unwrap().active);
        assert!(!state.is_tracking_active());

        start_tracking(State(Arc::clone(&state))).await;
        assert!(state.is_tracking_active());
    }

    #[tokio::test]
    async fn test_calibrate_requires_avatar() {
        let state = state();
        let Json(response) = calibrate(State(Arc::clone(&state))).await;
        assert!(!response.success);

        state.set_avatar(RigModel::full("cal")).await.unwrap();
        let Json(response) = calibrate(State(state)).await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_load_avatar_endpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rig.json");
        std::fs::write(&path, r#"{"name": "api-rig", "bones": ["head"]}"#).unwrap();

        let state = state();
        let Json(response) = load_avatar(
            State(Arc::clone(&state)),
            Json(LoadAvatarRequest { path }),
        )
        .await;
        assert_eq!(response.data.unwrap().avatar, "api-rig");

        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.data.unwrap().avatar.as_deref(), Some("api-rig"));
    }

    #[tokio::test]
    async fn test_load_avatar_missing_file() {
        let dir = TempDir::new().unwrap();
        let Json(response) = load_avatar(
            State(state()),
            Json(LoadAvatarRequest {
                path: dir.path().join("missing.toml"),
            }),
        )
        .await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("missing.toml"));
    }

    #[tokio::test]
    async fn test_update_config_validates() {
        let state = state();
        let Json(response) = update_config(
            State(Arc::clone(&state)),
            Json(ConfigUpdate {
                head_gain: Some(-1.0),
                face: Some(false),
                pose: None,
                hands: None,
            }),
        )
        .await;
        assert!(!response.success);
        assert!(state.config.read().await.retarget.face);

        let Json(response) = update_config(
            State(Arc::clone(&state)),
            Json(ConfigUpdate {
                head_gain: Some(2.5),
                face: Some(false),
                pose: None,
                hands: None,
            }),
        )
        .await;
        assert!(response.success);

        let Json(config) = get_config(State(state)).await;
        assert_eq!(config.retarget.head_gain, 2.5);
        assert!(!config.retarget.face);
    }
}
