//! Upload Queue
//!
//! Unbounded FIFO of pending samples, drained one at a time by a single
//! worker task. Failed uploads are dropped, never retried. After every
//! attempt the worker pauses for the settle delay before the next one.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

use super::{Sample, SampleUploader};
use crate::session::SessionState;

/// Result of one [`UploadQueue::drain_once`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was queued.
    Idle,
    /// The head sample was accepted.
    Uploaded,
    /// The head sample was rejected or the request failed; it was dropped.
    Dropped,
    /// Another drain was in flight; it will run again when it finishes.
    Deferred,
}

struct QueueInner {
    pending: Mutex<VecDeque<Sample>>,
    /// Set while a drain is in flight.
    draining: AtomicBool,
    /// Set when a drain was requested during another one.
    rerun: AtomicBool,
    wake: Notify,
    uploader: Arc<dyn SampleUploader>,
    session: SessionState,
    settle_delay: Duration,
}

/// Handle to the upload queue. Cheap to clone.
#[derive(Clone)]
pub struct UploadQueue {
    inner: Arc<QueueInner>,
}

impl UploadQueue {
    pub fn new(
        uploader: Arc<dyn SampleUploader>,
        session: SessionState,
        settle_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                rerun: AtomicBool::new(false),
                wake: Notify::new(),
                uploader,
                session,
                settle_delay,
            }),
        }
    }

    /// Spawn the worker that drains the queue whenever samples arrive.
    ///
    /// On shutdown the worker finishes the sample in flight (if any) and
    /// exits; samples still queued are logged and left unsent.
    pub fn spawn_worker(&self, mut shutdown_rx: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            info!("Upload worker started");
            loop {
                tokio::select! {
                    () = queue.inner.wake.notified() => {}
                    res = shutdown_rx.changed() => {
                        if res.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                loop {
                    match queue.drain_once().await {
                        DrainOutcome::Uploaded | DrainOutcome::Dropped => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                        DrainOutcome::Idle | DrainOutcome::Deferred => break,
                    }
                }
            }

            let left = queue.len();
            if left > 0 {
                warn!(left, "Upload worker stopped with samples still queued");
            }
            info!("Upload worker stopped");
        })
    }

    /// Append a sample and wake the worker.
    pub fn enqueue(&self, sample: Sample) {
        let depth = {
            let mut pending = self.lock_pending();
            pending.push_back(sample);
            // Counted while the lock is held so the counter never trails the queue.
            self.inner.session.note_enqueued();
            pending.len()
        };
        debug!(depth, "Sample queued");
        self.inner.wake.notify_one();
    }

    /// Samples waiting (not counting one in flight).
    pub fn len(&self) -> usize {
        self.lock_pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an upload attempt is in progress.
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst)
    }

    /// Attempt to transmit the head of the queue.
    ///
    /// At most one drain runs at a time. A call made while another drain is
    /// in flight returns [`DrainOutcome::Deferred`] and makes the in-flight
    /// drain schedule another pass when it completes.
    pub async fn drain_once(&self) -> DrainOutcome {
        if self.inner.draining.swap(true, Ordering::SeqCst) {
            self.inner.rerun.store(true, Ordering::SeqCst);
            return DrainOutcome::Deferred;
        }

        let Some(sample) = self.lock_pending().pop_front() else {
            self.inner.draining.store(false, Ordering::SeqCst);
            return DrainOutcome::Idle;
        };

        let result = self.inner.uploader.upload(&sample).await;
        let outcome = match &result {
            Ok(()) => {
                debug!(sample = %sample.id, label = %sample.label, "Sample uploaded");
                DrainOutcome::Uploaded
            }
            Err(e) => {
                warn!(sample = %sample.id, label = %sample.label, error = %e, "Sample upload failed, dropping");
                DrainOutcome::Dropped
            }
        };
        self.inner.session.note_upload_finished(&sample.label, &result);
        drop(sample);

        tokio::time::sleep(self.inner.settle_delay).await;

        self.inner.draining.store(false, Ordering::SeqCst);
        if self.inner.rerun.swap(false, Ordering::SeqCst) || !self.is_empty() {
            self.inner.wake.notify_one();
        }
        outcome
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, VecDeque<Sample>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
