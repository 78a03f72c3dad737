//! Frame Source
//!
//! Owns the one active camera session. The device is opened and read on a
//! blocking thread (camera handles are `!Send`); the latest decoded frame is
//! published through a `watch` cell that readers sample on demand.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;
use tokio::sync::{oneshot, watch, Mutex};
use tracing::{debug, error, info, warn};

use super::{CameraError, Frame};
use crate::detection::{DetectionSender, DetectorConfig, HandDetector};

/// An opened camera device. Lives on the capture thread only.
pub trait CameraDevice {
    /// Actual resolution (may differ from the requested one).
    fn resolution(&self) -> (u32, u32);

    /// Block until the next frame is available and return it as RGB.
    fn next_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Release the device.
    fn stop(&mut self) -> Result<(), CameraError> {
        Ok(())
    }
}

/// Opens camera devices.
pub trait CameraBackend: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> String;

    /// Open the device. Called on the capture thread.
    fn open(&self, width: u32, height: u32, fps: u32)
        -> Result<Box<dyn CameraDevice>, CameraError>;
}

/// Requested capture parameters.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub detector: DetectorConfig,
}

/// How long a stopping capture thread may take to release the device.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// A running capture thread. Dropping it signals the thread to stop.
struct CameraSession {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl CameraSession {
    /// Signal the thread and wait for it to release the device.
    ///
    /// Returns `false` if the thread is still running after the timeout; the
    /// session then still owns the device.
    async fn shutdown(&mut self) -> bool {
        let _ = self.shutdown_tx.send(true);
        let Some(handle) = self.handle.as_mut() else {
            return true;
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
            warn!("Camera thread did not stop within {SHUTDOWN_TIMEOUT:?}");
            return false;
        }
        self.handle = None;
        true
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// A session waiting for its device to open.
///
/// If `start` is cancelled before the open is acknowledged, the session is
/// told to stop and parked in the active slot so the next `stop` or `start`
/// joins the thread before touching the device again.
struct PendingOpen<'a> {
    slot: &'a mut Option<CameraSession>,
    session: Option<CameraSession>,
}

impl PendingOpen<'_> {
    fn into_session(mut self) -> Option<CameraSession> {
        self.session.take()
    }
}

impl Drop for PendingOpen<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.shutdown_tx.send(true);
            *self.slot = Some(session);
        }
    }
}

/// Single-instance camera frame source.
pub struct FrameSource {
    backend: Arc<dyn CameraBackend>,
    settings: CaptureSettings,
    frames: Arc<watch::Sender<Option<Arc<Frame>>>>,
    detections: DetectionSender,
    active: Mutex<Option<CameraSession>>,
}

impl FrameSource {
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        settings: CaptureSettings,
        detections: DetectionSender,
    ) -> Self {
        let (frames, _) = watch::channel(None);
        Self {
            backend,
            settings,
            frames: Arc::new(frames),
            detections,
            active: Mutex::new(None),
        }
    }

    /// Acquire the camera and start producing frames.
    ///
    /// A session that is already running is stopped first, so at most one
    /// device handle is ever held. `detector`, if given, receives every frame
    /// until the camera stops.
    pub async fn start(&self, detector: Option<Box<dyn HandDetector>>) -> Result<(), CameraError> {
        let mut active = self.active.lock().await;
        if let Some(mut previous) = active.take() {
            info!("Stopping previous camera session before restart");
            if !previous.shutdown().await {
                *active = Some(previous);
                return Err(CameraError::Unavailable(
                    "previous camera session is still releasing the device".into(),
                ));
            }
            self.reset_outputs();
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), CameraError>>();

        let backend = Arc::clone(&self.backend);
        let frames = Arc::clone(&self.frames);
        let detections = self.detections.clone();
        let settings = self.settings;

        let handle = tokio::task::spawn_blocking(move || {
            let backend_name = backend.name();
            let mut device = match backend.open(settings.width, settings.height, settings.fps) {
                Ok(d) => d,
                Err(e) => {
                    error!(camera = %backend_name, error = %e, "Failed to open camera");
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let (actual_w, actual_h) = device.resolution();
            info!(
                camera = %backend_name,
                requested_w = settings.width,
                requested_h = settings.height,
                actual_w,
                actual_h,
                fps = settings.fps,
                "Camera capture started"
            );
            let _ = ready_tx.send(Ok(()));

            let mut detector = detector;
            if let Some(d) = detector.as_mut() {
                d.set_options(&settings.detector);
            }

            let frame_interval = Duration::from_millis(1000 / u64::from(settings.fps.max(1)));
            let mut sequence = 0u64;

            loop {
                if *shutdown_rx.borrow() || shutdown_rx.has_changed().is_err() {
                    debug!(camera = %backend_name, "Camera shutdown requested");
                    break;
                }

                let frame_start = Instant::now();

                match device.next_frame() {
                    Ok(image) => {
                        sequence += 1;
                        let frame = Arc::new(Frame::new(sequence, image));
                        frames.send_replace(Some(Arc::clone(&frame)));
                        if let Some(d) = detector.as_mut() {
                            d.send(&frame, &detections);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to capture camera frame");
                        std::thread::sleep(Duration::from_millis(50));
                        continue;
                    }
                }

                // Pace to target FPS
                if let Some(remaining) = frame_interval.checked_sub(frame_start.elapsed()) {
                    std::thread::sleep(remaining);
                }
            }

            if let Some(mut d) = detector {
                d.close();
            }
            if let Err(e) = device.stop() {
                warn!(error = %e, "Error stopping camera stream");
            }
            info!(camera = %backend_name, frames = sequence, "Camera capture stopped");
        });

        let pending = PendingOpen {
            slot: &mut *active,
            session: Some(CameraSession {
                shutdown_tx,
                handle: Some(handle),
            }),
        };
        let ready = ready_rx.await;
        let Some(mut session) = pending.into_session() else {
            return Err(CameraError::Internal("camera session lost".into()));
        };

        match ready {
            Ok(Ok(())) => {
                *active = Some(session);
                Ok(())
            }
            Ok(Err(e)) => {
                session.shutdown().await;
                Err(e)
            }
            Err(_) => {
                session.shutdown().await;
                Err(CameraError::Internal(
                    "capture thread exited before the camera opened".into(),
                ))
            }
        }
    }

    /// Release the camera. Stopping an already stopped source is a no-op.
    ///
    /// A thread that misses the shutdown timeout stays registered, so the
    /// next `stop` or `start` waits for it again.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        let Some(mut session) = active.take() else {
            debug!("Camera already stopped");
            return;
        };
        if session.shutdown().await {
            self.reset_outputs();
            info!("Camera stopped");
        } else {
            *active = Some(session);
        }
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Most recent decoded frame, or `None` while the camera is not ready.
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        self.frames
            .borrow()
            .as_ref()
            .filter(|frame| !frame.is_empty())
            .cloned()
    }

    /// Subscribe to frame arrivals.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.frames.subscribe()
    }

    /// Forget the last frame and report "no hands": nothing is in view
    /// once the device is released.
    fn reset_outputs(&self) {
        self.frames.send_replace(None);
        self.detections.clear();
    }
}
