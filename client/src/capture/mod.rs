//! Capture Module
//!
//! Camera capture (`nokhwa` or a synthetic pattern), the single-instance
//! frame source, and JPEG encoding of frames into sample payloads.

pub mod encoder;
pub mod source;
pub mod synthetic;
pub mod webcam;

pub use encoder::CaptureEncoder;
pub use source::{CameraBackend, CameraDevice, FrameSource};
pub use synthetic::SyntheticCamera;
pub use webcam::{enumerate_webcam_devices, WebcamBackend, WebcamDevice};

use image::RgbImage;
use thiserror::Error;

/// Camera-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("No camera backend available")]
    NoBackend,
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    #[error("Permission denied for camera access")]
    PermissionDenied,
    #[error("Camera not running")]
    NotRunning,
    #[error("Camera error: {0}")]
    Internal(String),
}

/// Encoding errors.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// No frame has been decoded yet (camera warming up).
    #[error("Camera frame not ready")]
    NotReady,
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Encoder task failed: {0}")]
    Task(String),
}

/// A decoded RGB camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic frame number within one camera session.
    pub sequence: u64,
    pub image: RgbImage,
}

impl Frame {
    pub const fn new(sequence: u64, image: RgbImage) -> Self {
        Self { sequence, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// A frame with zero dimensions carries no picture yet.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}
