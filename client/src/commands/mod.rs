//! User Actions
//!
//! The action set a view binds to. Every action takes the shared
//! [`AppState`](crate::AppState), logs through `tracing`, and records its
//! failure as the current session notice before returning it.

pub mod camera;
pub mod capture;
pub mod models;
pub mod recording;
pub mod samples;

pub use camera::{enumerate_cameras, start_camera, stop_camera};
pub use capture::{capture_once, select_category, set_label};
pub use models::{delete_model, fetch_models, predict_once, select_model, train_model};
pub use recording::{start_recording, stop_recording};
pub use samples::{clear_samples, fetch_samples};

use crate::error::PipelineError;
use crate::session::SessionState;

/// Surface a failed action as the session notice.
fn reported<T>(session: &SessionState, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
    if let Err(e) = &result {
        session.report(e);
    }
    result
}
