//! Single-shot capture and label selection.

use sd_common::Category;
use tracing::info;

use super::reported;
use crate::error::{PipelineError, PreconditionError};
use crate::upload::Sample;
use crate::AppState;

/// Capture one frame under the selected label and queue it for upload.
///
/// Goes through the same queue as recorded samples so that ordering and
/// pacing hold for both.
#[tracing::instrument(skip(state))]
pub async fn capture_once(state: &AppState) -> Result<String, PipelineError> {
    let label = reported(&state.session, enqueue_current(state).await)?;
    info!(label = %label, "Image captured");
    state
        .session
        .success(format!("Image captured for: {label}"));
    Ok(label)
}

async fn enqueue_current(state: &AppState) -> Result<String, PipelineError> {
    state.detection.require_hand("capture")?;
    let label = state.session.selected_label();
    let payload = state.encoder.encode_current(&state.camera).await?;
    state.uploads.enqueue(Sample::new(&label, payload));
    Ok(label)
}

/// Select the label for subsequent captures.
///
/// An armed recording keeps the label it started with.
pub fn set_label(state: &AppState, label: &str) -> Result<(), PipelineError> {
    let result = state
        .session
        .set_label(label)
        .map_err(PipelineError::from);
    reported(&state.session, result)
}

/// Switch category; returns the newly selected label.
pub fn select_category(state: &AppState, name: &str) -> Result<String, PipelineError> {
    let result: Result<String, PipelineError> = Category::from_name(name)
        .map(|category| state.session.select_category(category))
        .ok_or_else(|| PreconditionError::UnknownCategory(name.to_string()).into());
    reported(&state.session, result)
}
