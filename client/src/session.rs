//! Session State
//!
//! The one owned context the view layer reads: selected label, recording
//! session, queue depth, cached inventory and models, latest prediction and
//! the latest user-facing notice. Held in a `watch` cell so every update is
//! visible to subscribers and mutation is serialized.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sd_common::{Category, Model, Prediction, SampleInventory};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{PipelineError, PreconditionError};
use crate::network::ApiError;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Recording state as the view sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingSession {
    pub armed: bool,
    /// Label fixed when the session was armed.
    pub label: String,
    pub interval_ms: u64,
    /// Samples resident in the upload queue plus the one being uploaded.
    pub queued_count: u64,
}

/// Everything the view renders.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub category: Category,
    pub selected_label: String,
    pub recording: RecordingSession,
    pub model_name: String,
    pub models: Vec<Model>,
    pub inventory: SampleInventory,
    pub prediction: Option<Prediction>,
    pub notice: Option<Notice>,
    pub uploads_succeeded: u64,
    pub uploads_failed: u64,
}

/// Shared handle to the session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    view: Arc<watch::Sender<SessionView>>,
}

impl SessionState {
    pub fn new(model_name: impl Into<String>, interval_ms: u64) -> Self {
        let category = Category::default();
        let view = SessionView {
            category,
            selected_label: category.default_label().to_string(),
            recording: RecordingSession {
                armed: false,
                label: category.default_label().to_string(),
                interval_ms,
                queued_count: 0,
            },
            model_name: model_name.into(),
            models: Vec::new(),
            inventory: SampleInventory::default(),
            prediction: None,
            notice: None,
            uploads_succeeded: 0,
            uploads_failed: 0,
        };
        let (tx, _) = watch::channel(view);
        Self { view: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> SessionView {
        self.view.borrow().clone()
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    pub fn selected_label(&self) -> String {
        self.view.borrow().selected_label.clone()
    }

    /// Change the selected label. Never touches an armed recording session.
    pub fn set_label(&self, label: &str) -> Result<(), PreconditionError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PreconditionError::EmptyLabel);
        }
        self.view.send_modify(|v| {
            v.selected_label = label.to_string();
            if let Some(category) = Category::ALL.into_iter().find(|c| c.contains(label)) {
                if !v.category.contains(label) {
                    v.category = category;
                }
            }
            if !v.recording.armed {
                v.recording.label = label.to_string();
            }
        });
        Ok(())
    }

    /// Switch category and select its first symbol.
    pub fn select_category(&self, category: Category) -> String {
        let label = category.default_label().to_string();
        self.view.send_modify(|v| {
            v.category = category;
            v.selected_label.clone_from(&label);
            if !v.recording.armed {
                v.recording.label.clone_from(&label);
            }
        });
        label
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    pub fn recording(&self) -> RecordingSession {
        self.view.borrow().recording.clone()
    }

    pub fn queued_count(&self) -> u64 {
        self.view.borrow().recording.queued_count
    }

    pub(crate) fn arm(&self, label: &str, interval_ms: u64) {
        self.view.send_modify(|v| {
            v.recording.armed = true;
            v.recording.label = label.to_string();
            v.recording.interval_ms = interval_ms;
        });
    }

    pub(crate) fn disarm(&self) {
        self.view.send_modify(|v| {
            v.recording.armed = false;
            v.recording.label.clone_from(&v.selected_label);
        });
    }

    pub(crate) fn note_enqueued(&self) {
        self.view.send_modify(|v| v.recording.queued_count += 1);
    }

    /// Account for a finished upload attempt: the sample has left the queue
    /// whether or not the service accepted it.
    pub(crate) fn note_upload_finished(&self, label: &str, result: &Result<(), ApiError>) {
        self.view.send_modify(|v| {
            if v.recording.queued_count == 0 {
                warn!("Upload finished with queued counter already at zero");
            }
            v.recording.queued_count = v.recording.queued_count.saturating_sub(1);
            match result {
                Ok(()) => {
                    v.uploads_succeeded += 1;
                    v.inventory.record(label);
                }
                Err(e) => {
                    v.uploads_failed += 1;
                    v.notice = Some(Notice::new(
                        NoticeKind::Error,
                        format!("Error uploading sample: {e}"),
                    ));
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Models, inventory, prediction
    // ------------------------------------------------------------------

    pub fn model_name(&self) -> String {
        self.view.borrow().model_name.clone()
    }

    pub fn set_model_name(&self, name: &str) {
        self.view.send_modify(|v| v.model_name = name.trim().to_string());
    }

    pub fn inventory(&self) -> SampleInventory {
        self.view.borrow().inventory.clone()
    }

    pub(crate) fn set_inventory(&self, inventory: SampleInventory) {
        self.view.send_if_modified(|v| {
            if v.inventory == inventory {
                false
            } else {
                v.inventory = inventory;
                true
            }
        });
    }

    /// Replace the cached model list. When the selected model is not listed,
    /// the first listed one becomes the selection.
    pub(crate) fn set_models(&self, models: Vec<Model>) {
        self.view.send_modify(|v| {
            if !models.iter().any(|m| m.name == v.model_name) {
                if let Some(first) = models.first() {
                    debug!(from = %v.model_name, to = %first.name, "Selected model not listed, switching");
                    v.model_name.clone_from(&first.name);
                }
            }
            v.models = models;
        });
    }

    pub(crate) fn set_prediction(&self, prediction: Prediction) {
        self.view.send_modify(|v| v.prediction = Some(prediction));
    }

    // ------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------

    /// Record a failure as the current notice.
    pub fn report(&self, err: &PipelineError) {
        let notice = err.notice();
        debug!(kind = ?notice.kind, message = %notice.message, "Notice");
        self.view.send_modify(|v| v.notice = Some(notice));
    }

    pub fn success(&self, message: impl Into<String>) {
        let notice = Notice::new(NoticeKind::Success, message);
        self.view.send_modify(|v| v.notice = Some(notice));
    }

    pub fn notice(&self) -> Option<Notice> {
        self.view.borrow().notice.clone()
    }
}
