//! `SignDeck` Capture Client Library
//!
//! Camera capture, hand-presence gating, and the ordered sample upload
//! pipeline behind the gesture dataset dashboard.

pub mod capture;
pub mod commands;
pub mod config;
pub mod detection;
pub mod error;
pub mod network;
pub mod recording;
pub mod samples;
pub mod session;
pub mod upload;

use std::sync::Arc;
use std::time::Duration;

use capture::source::CaptureSettings;
use capture::{CameraBackend, CaptureEncoder, FrameSource, SyntheticCamera, WebcamBackend};
use config::{CameraSource, Config};
use detection::DetectionGate;
use network::ApiClient;
use recording::RecordingController;
use session::SessionState;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use upload::{SampleUploader, UploadQueue};

pub use error::{PipelineError, PreconditionError};

/// Application state shared across commands.
pub struct AppState {
    pub config: Config,
    /// HTTP client for the remote service.
    pub api: Arc<ApiClient>,
    /// View-facing state.
    pub session: SessionState,
    /// Latest hand presence.
    pub detection: DetectionGate,
    /// Camera frame source.
    pub camera: Arc<FrameSource>,
    pub encoder: CaptureEncoder,
    pub uploads: UploadQueue,
    pub recorder: RecordingController,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl AppState {
    /// Build the pipeline with the camera backend named by `config`.
    ///
    /// Must be called inside a Tokio runtime: the detection gate, upload
    /// worker and inventory refresh are spawned immediately.
    pub fn start(config: Config) -> Result<Self, PipelineError> {
        let backend: Arc<dyn CameraBackend> = match config.camera_source {
            CameraSource::Webcam { index } => Arc::new(WebcamBackend::new(index)),
            CameraSource::Synthetic => Arc::new(SyntheticCamera::new()),
        };
        Self::with_backend(config, backend)
    }

    /// Build the pipeline around a specific camera backend.
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn CameraBackend>,
    ) -> Result<Self, PipelineError> {
        let api = Arc::new(ApiClient::new(&config.api_base_url, config.http_timeout)?);
        let uploader: Arc<dyn SampleUploader> = api.clone();
        Ok(Self::with_parts(config, backend, api, uploader))
    }

    /// Build the pipeline from explicit collaborators.
    pub fn with_parts(
        config: Config,
        backend: Arc<dyn CameraBackend>,
        api: Arc<ApiClient>,
        uploader: Arc<dyn SampleUploader>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = SessionState::new(&config.default_model_name, config.recording_interval_ms);
        let (detection, gate_task) = DetectionGate::spawn(shutdown_rx.clone());

        let camera = Arc::new(FrameSource::new(
            backend,
            CaptureSettings {
                width: config.capture_width,
                height: config.capture_height,
                fps: config.camera_fps,
                detector: config.detector,
            },
            detection.sender(),
        ));
        let encoder = CaptureEncoder::new(
            config.capture_width,
            config.capture_height,
            config.jpeg_quality,
        );

        let uploads = UploadQueue::new(uploader, session.clone(), config.upload_settle_delay);
        let upload_task = uploads.spawn_worker(shutdown_rx.clone());

        let refresh_task = samples::start_inventory_refresh(
            Arc::clone(&api),
            session.clone(),
            config.inventory_refresh,
            shutdown_rx,
        );

        let recorder = RecordingController::new(
            Arc::clone(&camera),
            encoder,
            uploads.clone(),
            detection.clone(),
            session.clone(),
            config.skip_ticks_without_hand,
        );

        info!(api = %config.api_base_url, "Capture pipeline ready");

        Self {
            config,
            api,
            session,
            detection,
            camera,
            encoder,
            uploads,
            recorder,
            shutdown_tx,
            tasks: Mutex::new(vec![gate_task, upload_task, refresh_task]),
        }
    }

    /// Stop recording, release the camera and stop background tasks.
    pub async fn shutdown(&self) {
        info!("Shutting down capture pipeline");
        let _ = self.recorder.stop().await;
        self.camera.stop().await;
        let _ = self.shutdown_tx.send(true);

        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        let joined = tokio::time::timeout(Duration::from_secs(5), async {
            for task in tasks {
                let _ = task.await;
            }
        })
        .await;
        if joined.is_err() {
            warn!("Background tasks did not stop within 5s");
        }
        info!("Capture pipeline shut down");
    }
}
