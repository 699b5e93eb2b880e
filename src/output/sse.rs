//! Server-Sent Events for real-time pose updates

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::avatar::PoseSnapshot;
use crate::AppState;

/// Create an SSE stream of pose snapshots
pub fn create_pose_stream(
    app_state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.subscribe_snapshots();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(snapshot) => snapshot_to_event(&snapshot).map(Ok),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// JSON payload of a snapshot event
pub fn snapshot_payload(snapshot: &PoseSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}

/// Convert a pose snapshot to an SSE event
fn snapshot_to_event(snapshot: &PoseSnapshot) -> Option<Event> {
    match snapshot_payload(snapshot) {
        Ok(data) => Some(Event::default().event("pose").data(data)),
        Err(e) => {
            tracing::warn!("Failed to encode pose snapshot {}: {}", snapshot.frame, e);
            None
        }
    }
}
