//! Capture Encoder
//!
//! Scales a camera frame to the capture size and compresses it as JPEG.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};

use super::{EncodeError, Frame, FrameSource};

/// JPEG encoder for sample payloads.
#[derive(Debug, Clone, Copy)]
pub struct CaptureEncoder {
    width: u32,
    height: u32,
    quality: u8,
}

impl CaptureEncoder {
    /// `quality` is the JPEG quality in `1..=100`.
    pub const fn new(width: u32, height: u32, quality: u8) -> Self {
        Self {
            width,
            height,
            quality,
        }
    }

    /// Encode `frame`. A missing or empty frame means the camera has not
    /// warmed up yet and yields [`EncodeError::NotReady`].
    pub fn encode(&self, frame: Option<&Frame>) -> Result<Bytes, EncodeError> {
        let frame = frame
            .filter(|f| !f.is_empty())
            .ok_or(EncodeError::NotReady)?;

        let mut buf = Vec::with_capacity((self.width * self.height / 4) as usize);
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
            if frame.image.dimensions() == (self.width, self.height) {
                encoder.encode_image(&frame.image)?;
            } else {
                let scaled =
                    imageops::resize(&frame.image, self.width, self.height, FilterType::Triangle);
                encoder.encode_image(&scaled)?;
            }
        }

        Ok(Bytes::from(buf))
    }

    /// Encode the source's current frame on the blocking pool.
    pub async fn encode_current(&self, source: &FrameSource) -> Result<Bytes, EncodeError> {
        let frame = source.current_frame().ok_or(EncodeError::NotReady)?;
        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode(Some(&frame)))
            .await
            .map_err(|e| EncodeError::Task(e.to_string()))?
    }
}
