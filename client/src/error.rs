//! Pipeline Errors
//!
//! Every failure the capture pipeline can produce, and its conversion into a
//! user-facing [`Notice`](crate::session::Notice).

use thiserror::Error;

use crate::capture::{CameraError, EncodeError};
use crate::network::ApiError;
use crate::session::{Notice, NoticeKind};

/// An action was refused before doing any work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("No hand detected. Cannot {0}.")]
    NoHandDetected(&'static str),
    #[error("Recording already in progress")]
    AlreadyRecording,
    #[error("Recording interval must be between {min} and {max} ms (got {got})")]
    IntervalOutOfRange { got: u64, min: u64, max: u64 },
    #[error("Please enter a model name")]
    EmptyModelName,
    #[error("At least {needed} samples are required to train a model (have {have})")]
    NotEnoughSamples { have: u64, needed: u64 },
    #[error("Label must not be empty")]
    EmptyLabel,
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
}

/// Umbrella error for the action set.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl PipelineError {
    /// Convert into the message shown to the user.
    pub fn notice(&self) -> Notice {
        let kind = match self {
            Self::Precondition(_) => NoticeKind::Warning,
            _ => NoticeKind::Error,
        };
        Notice::new(kind, self.to_string())
    }

    /// Whether the failure only means "try again on the next frame".
    pub const fn is_frame_not_ready(&self) -> bool {
        matches!(self, Self::Encode(EncodeError::NotReady))
    }
}
