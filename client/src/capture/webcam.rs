//! Webcam Capture Module
//!
//! Camera capture using `nokhwa`. The device is opened and read on the
//! frame source's blocking thread since `nokhwa::Camera` is `!Send`.

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::source::{CameraBackend, CameraDevice};
use super::CameraError;

/// A webcam device available for capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebcamDevice {
    /// Device index (used for opening).
    pub index: u32,
    /// Human-readable device name.
    pub name: String,
    /// Device description (driver info).
    pub description: String,
}

/// Enumerate available webcam devices.
pub fn enumerate_webcam_devices() -> Result<Vec<WebcamDevice>, CameraError> {
    let backend = nokhwa::native_api_backend().ok_or(CameraError::NoBackend)?;

    let cameras = nokhwa::query(backend)
        .map_err(|e| CameraError::Unavailable(format!("Failed to query cameras: {e}")))?;

    Ok(cameras
        .into_iter()
        .map(|info| {
            let index = match info.index() {
                CameraIndex::Index(i) => *i,
                CameraIndex::String(_) => 0,
            };
            WebcamDevice {
                index,
                name: info.human_name(),
                description: info.description().to_string(),
            }
        })
        .collect())
}

/// Native camera backend.
#[derive(Debug, Clone, Copy)]
pub struct WebcamBackend {
    device_index: u32,
}

impl WebcamBackend {
    /// `device_index` selects the camera (0 = first camera).
    pub const fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

impl CameraBackend for WebcamBackend {
    fn name(&self) -> String {
        format!("webcam:{}", self.device_index)
    }

    fn open(
        &self,
        _width: u32,
        _height: u32,
        _fps: u32,
    ) -> Result<Box<dyn CameraDevice>, CameraError> {
        // The encoder scales to the capture size, so take whatever the
        // device streams fastest.
        let index = CameraIndex::Index(self.device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = Camera::new(index, requested).map_err(map_open_error)?;
        camera.open_stream().map_err(map_open_error)?;

        Ok(Box::new(WebcamStream { camera }))
    }
}

struct WebcamStream {
    camera: Camera,
}

impl CameraDevice for WebcamStream {
    fn resolution(&self) -> (u32, u32) {
        let format = self.camera.camera_format();
        (format.resolution().width_x, format.resolution().height_y)
    }

    fn next_frame(&mut self) -> Result<RgbImage, CameraError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::Internal(format!("capture: {e}")))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Internal(format!("decode: {e}")))?;

        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            CameraError::Internal(format!("frame buffer does not match {width}x{height}"))
        })
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        debug!("Stopping webcam stream");
        self.camera
            .stop_stream()
            .map_err(|e| CameraError::Internal(e.to_string()))
    }
}

fn map_open_error(e: nokhwa::NokhwaError) -> CameraError {
    let message = e.to_string();
    if message.to_ascii_lowercase().contains("permission") {
        CameraError::PermissionDenied
    } else {
        CameraError::Unavailable(message)
    }
}
