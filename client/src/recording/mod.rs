//! Recording Controller
//!
//! Timer-driven producer. While armed, each tick captures the current frame,
//! encodes it and queues it under the label fixed when recording started.
//! Stopping cancels the timer only; queued samples keep draining.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::capture::{CaptureEncoder, EncodeError, FrameSource};
use crate::config::{MAX_RECORDING_INTERVAL_MS, MIN_RECORDING_INTERVAL_MS};
use crate::detection::DetectionGate;
use crate::error::{PipelineError, PreconditionError};
use crate::session::SessionState;
use crate::upload::{Sample, UploadQueue};

/// What a finished recording session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub label: String,
    pub captured: u64,
}

/// Everything a tick needs, cloned into the timer task.
#[derive(Clone)]
struct Producer {
    frames: Arc<FrameSource>,
    encoder: CaptureEncoder,
    queue: UploadQueue,
    gate: DetectionGate,
    skip_without_hand: bool,
}

impl Producer {
    /// Capture one sample. Returns whether a sample was queued.
    async fn tick(&self, label: &str, stop_rx: &watch::Receiver<bool>) -> bool {
        if self.skip_without_hand && !self.gate.current_state().is_active {
            debug!("No hand in view, skipping tick");
            return false;
        }

        let payload = match self.encoder.encode_current(&self.frames).await {
            Ok(payload) => payload,
            Err(EncodeError::NotReady) => {
                debug!("Frame not ready, skipping tick");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to encode frame, skipping tick");
                return false;
            }
        };

        // A stop that arrived while encoding wins over this tick.
        if *stop_rx.borrow() {
            return false;
        }

        self.queue.enqueue(Sample::new(label, payload));
        true
    }

    async fn run(self, label: String, period: Duration, mut stop_rx: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut captured = 0u64;

        loop {
            tokio::select! {
                biased;
                res = stop_rx.changed() => {
                    if res.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if self.tick(&label, &stop_rx).await {
                        captured += 1;
                    }
                }
            }
        }

        captured
    }
}

struct ActiveRecording {
    label: String,
    stop_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<u64>,
}

/// Idle/Armed state machine driving periodic capture.
pub struct RecordingController {
    producer: Producer,
    session: SessionState,
    active: Mutex<Option<ActiveRecording>>,
}

impl RecordingController {
    pub fn new(
        frames: Arc<FrameSource>,
        encoder: CaptureEncoder,
        queue: UploadQueue,
        gate: DetectionGate,
        session: SessionState,
        skip_without_hand: bool,
    ) -> Self {
        Self {
            producer: Producer {
                frames,
                encoder,
                queue,
                gate,
                skip_without_hand,
            },
            session,
            active: Mutex::new(None),
        }
    }

    /// Idle -> Armed.
    ///
    /// Requires a hand in view. Fixes the currently selected label for the
    /// whole session and returns it.
    pub async fn start(&self, interval_ms: u64) -> Result<String, PipelineError> {
        if !(MIN_RECORDING_INTERVAL_MS..=MAX_RECORDING_INTERVAL_MS).contains(&interval_ms) {
            return Err(PreconditionError::IntervalOutOfRange {
                got: interval_ms,
                min: MIN_RECORDING_INTERVAL_MS,
                max: MAX_RECORDING_INTERVAL_MS,
            }
            .into());
        }

        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(PreconditionError::AlreadyRecording.into());
        }
        self.producer.gate.require_hand("start recording")?;

        let label = self.session.selected_label();
        self.session.arm(&label, interval_ms);

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.producer.clone().run(
            label.clone(),
            Duration::from_millis(interval_ms),
            stop_rx,
        ));

        info!(label = %label, interval_ms, "Recording started");
        *active = Some(ActiveRecording {
            label: label.clone(),
            stop_tx,
            task,
        });
        Ok(label)
    }

    /// Armed -> Idle. Returns `None` when not recording.
    pub async fn stop(&self) -> Option<RecordingSummary> {
        let recording = self.active.lock().await.take()?;
        let _ = recording.stop_tx.send(true);
        let captured = match recording.task.await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Recording task ended abnormally");
                0
            }
        };
        self.session.disarm();

        info!(
            label = %recording.label,
            captured,
            queued = self.session.queued_count(),
            "Recording stopped"
        );
        Some(RecordingSummary {
            label: recording.label,
            captured,
        })
    }

    pub async fn is_armed(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::capture::source::CaptureSettings;
    use crate::capture::SyntheticCamera;
    use crate::detection::{DetectionEvent, DetectorConfig};
    use crate::network::ApiError;
    use crate::upload::SampleUploader;

    struct NullUploader;

    impl SampleUploader for NullUploader {
        fn upload<'a>(&'a self, _sample: &'a Sample) -> BoxFuture<'a, Result<(), ApiError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn controller() -> (RecordingController, DetectionGate, SessionState, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (gate, _task) = DetectionGate::spawn(shutdown_rx);
        let session = SessionState::new("m", 1000);
        let frames = Arc::new(FrameSource::new(
            Arc::new(SyntheticCamera::new()),
            CaptureSettings {
                width: 16,
                height: 16,
                fps: 50,
                detector: DetectorConfig::default(),
            },
            gate.sender(),
        ));
        let queue = UploadQueue::new(Arc::new(NullUploader), session.clone(), Duration::ZERO);
        let controller = RecordingController::new(
            frames,
            CaptureEncoder::new(16, 16, 90),
            queue,
            gate.clone(),
            session.clone(),
            true,
        );
        (controller, gate, session, shutdown_tx)
    }

    #[tokio::test]
    async fn start_without_hand_is_refused() {
        let (controller, _gate, session, _shutdown) = controller();

        let err = controller.start(1000).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Precondition(PreconditionError::NoHandDetected(_))
        ));
        assert!(!session.recording().armed);
        assert!(!controller.is_armed().await);
    }

    #[tokio::test]
    async fn interval_bounds_are_enforced() {
        let (controller, gate, _session, _shutdown) = controller();
        gate.sender().send(DetectionEvent::with_hands(1));
        gate.subscribe().wait_for(|s| s.is_active).await.unwrap();

        for bad in [0, 499, 5001] {
            assert!(matches!(
                controller.start(bad).await,
                Err(PipelineError::Precondition(
                    PreconditionError::IntervalOutOfRange { .. }
                ))
            ));
        }
        assert!(!controller.is_armed().await);
    }

    #[tokio::test]
    async fn start_twice_is_refused_and_stop_is_idempotent() {
        let (controller, gate, session, _shutdown) = controller();
        gate.sender().send(DetectionEvent::with_hands(1));
        gate.subscribe().wait_for(|s| s.is_active).await.unwrap();

        assert_eq!(controller.start(500).await.unwrap(), "A");
        assert!(session.recording().armed);
        assert!(matches!(
            controller.start(500).await,
            Err(PipelineError::Precondition(PreconditionError::AlreadyRecording))
        ));

        let summary = controller.stop().await.unwrap();
        assert_eq!(summary.label, "A");
        assert!(!session.recording().armed);
        assert!(controller.stop().await.is_none());
    }

    #[tokio::test]
    async fn ticks_without_frames_are_skipped() {
        let (controller, gate, session, _shutdown) = controller();
        gate.sender().send(DetectionEvent::with_hands(1));
        gate.subscribe().wait_for(|s| s.is_active).await.unwrap();

        // Camera never started: every tick hits "frame not ready".
        controller.start(500).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let summary = controller.stop().await.unwrap();

        assert_eq!(summary.captured, 0);
        assert_eq!(session.queued_count(), 0);
    }
}
