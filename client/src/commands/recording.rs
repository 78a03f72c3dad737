//! Recording Commands

use super::reported;
use crate::error::PipelineError;
use crate::recording::RecordingSummary;
use crate::AppState;

/// Arm periodic capture every `interval_ms` under the selected label.
#[tracing::instrument(skip(state))]
pub async fn start_recording(state: &AppState, interval_ms: u64) -> Result<String, PipelineError> {
    let label = reported(&state.session, state.recorder.start(interval_ms).await)?;
    state
        .session
        .success(format!("Recording started for: {label}"));
    Ok(label)
}

/// Disarm periodic capture. Queued samples keep uploading.
///
/// Returns `None` when nothing was recording.
#[tracing::instrument(skip(state))]
pub async fn stop_recording(state: &AppState) -> Option<RecordingSummary> {
    let summary = state.recorder.stop().await?;
    let queued = state.session.queued_count();
    let message = if queued > 0 {
        format!(
            "Recording stopped for: {} ({} captured, {queued} still uploading)",
            summary.label, summary.captured
        )
    } else {
        format!(
            "Recording stopped for: {} ({} captured)",
            summary.label, summary.captured
        )
    };
    state.session.success(message);
    Some(summary)
}
