//! Camera Commands

use tracing::{info, warn};

use super::reported;
use crate::capture::{enumerate_webcam_devices, CameraError, WebcamDevice};
use crate::detection::HandDetector;
use crate::error::PipelineError;
use crate::AppState;

/// Start the camera, replacing any running session.
///
/// `detector` receives every frame; without one, hand presence only changes
/// through events pushed on the gate's sender.
#[tracing::instrument(skip_all)]
pub async fn start_camera(
    state: &AppState,
    detector: Option<Box<dyn HandDetector>>,
) -> Result<(), PipelineError> {
    info!(has_detector = detector.is_some(), "Starting camera");
    let result = state
        .camera
        .start(detector)
        .await
        .map_err(PipelineError::from);
    if let Err(e) = &result {
        warn!(error = %e, "Camera failed to start");
    }
    reported(&state.session, result)
}

/// Stop the camera. Safe to call when already stopped.
#[tracing::instrument(skip(state))]
pub async fn stop_camera(state: &AppState) {
    state.camera.stop().await;
}

/// List capture devices.
///
/// Enumeration runs on a blocking thread; an empty list is not an error.
#[tracing::instrument]
pub async fn enumerate_cameras() -> Result<Vec<WebcamDevice>, PipelineError> {
    let devices = tokio::task::spawn_blocking(enumerate_webcam_devices)
        .await
        .map_err(|e| CameraError::Internal(format!("Enumeration task failed: {e}")))??;
    info!(count = devices.len(), "Enumerated cameras");
    Ok(devices)
}
