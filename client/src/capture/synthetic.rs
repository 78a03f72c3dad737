//! Synthetic Camera
//!
//! Generates a moving gradient instead of reading a device. Used for headless
//! runs (`CAMERA_SOURCE=synthetic`) and tests.

use image::{Rgb, RgbImage};

use super::source::{CameraBackend, CameraDevice};
use super::CameraError;

/// Backend producing deterministic gradient frames.
#[derive(Debug, Clone, Default)]
pub struct SyntheticCamera {
    /// Frames returned as zero-sized before the first real picture.
    warmup_frames: u32,
}

impl SyntheticCamera {
    pub const fn new() -> Self {
        Self { warmup_frames: 0 }
    }

    /// Emit `frames` empty frames first, like a camera that has opened but
    /// not reported its dimensions yet.
    #[must_use]
    pub const fn with_warmup(mut self, frames: u32) -> Self {
        self.warmup_frames = frames;
        self
    }
}

impl CameraBackend for SyntheticCamera {
    fn name(&self) -> String {
        "synthetic".into()
    }

    fn open(
        &self,
        width: u32,
        height: u32,
        _fps: u32,
    ) -> Result<Box<dyn CameraDevice>, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::Unavailable(format!(
                "invalid synthetic resolution {width}x{height}"
            )));
        }
        Ok(Box::new(SyntheticDevice {
            width,
            height,
            warmup_left: self.warmup_frames,
            tick: 0,
        }))
    }
}

struct SyntheticDevice {
    width: u32,
    height: u32,
    warmup_left: u32,
    tick: u32,
}

impl CameraDevice for SyntheticDevice {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.warmup_left > 0 {
            self.warmup_left -= 1;
            return Ok(RgbImage::new(0, 0));
        }
        self.tick = self.tick.wrapping_add(1);
        Ok(render_pattern(self.width, self.height, self.tick))
    }
}

/// Diagonal gradient shifted by `tick`.
pub fn render_pattern(width: u32, height: u32, tick: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        let b = x.wrapping_add(y).wrapping_add(tick) as u8;
        Rgb([r, g, b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_frames_are_empty() {
        let backend = SyntheticCamera::new().with_warmup(2);
        let mut device = backend.open(8, 6, 30).unwrap();
        assert_eq!(device.next_frame().unwrap().width(), 0);
        assert_eq!(device.next_frame().unwrap().width(), 0);
        let frame = device.next_frame().unwrap();
        assert_eq!(frame.dimensions(), (8, 6));
    }

    #[test]
    fn pattern_is_deterministic() {
        assert_eq!(render_pattern(16, 16, 3), render_pattern(16, 16, 3));
        assert_ne!(render_pattern(16, 16, 3), render_pattern(16, 16, 4));
    }

    #[test]
    fn rejects_zero_resolution() {
        assert!(SyntheticCamera::new().open(0, 10, 30).is_err());
    }
}
