//! Detection Gate
//!
//! Receives detector results over a channel and keeps only the latest one.
//! Readers never see a backlog: each event replaces the previous state.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::{DetectionEvent, DetectionState};
use crate::error::PreconditionError;

/// Cloneable handle detectors use to report results.
#[derive(Debug, Clone)]
pub struct DetectionSender {
    tx: mpsc::UnboundedSender<DetectionEvent>,
}

impl DetectionSender {
    /// Report a detector result. Returns `false` once the gate has shut down.
    pub fn send(&self, event: DetectionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Report that no hands are visible.
    pub fn clear(&self) -> bool {
        self.send(DetectionEvent::empty())
    }
}

/// Latest-value cell for hand presence.
#[derive(Debug, Clone)]
pub struct DetectionGate {
    state: watch::Receiver<DetectionState>,
    events: DetectionSender,
}

impl DetectionGate {
    /// Create the gate and spawn the task that folds detector events into it.
    ///
    /// The task ends when `shutdown_rx` flips to `true`.
    pub fn spawn(mut shutdown_rx: watch::Receiver<bool>) -> (Self, tokio::task::JoinHandle<()>) {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<DetectionEvent>();
        let (state_tx, state_rx) = watch::channel(DetectionState::default());

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = event_rx.recv() => {
                        let Some(event) = event else { break };
                        let next = DetectionState::from(&event);
                        state_tx.send_if_modified(|current| {
                            if *current == next {
                                false
                            } else {
                                debug!(hands = next.hands_present, active = next.is_active, "Hand state changed");
                                *current = next;
                                true
                            }
                        });
                    }
                    res = shutdown_rx.changed() => {
                        if res.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Detection gate stopped");
        });

        let gate = Self {
            state: state_rx,
            events: DetectionSender { tx: event_tx },
        };
        (gate, handle)
    }

    /// Latest hand state.
    pub fn current_state(&self) -> DetectionState {
        *self.state.borrow()
    }

    /// Subscribe to hand state changes.
    pub fn subscribe(&self) -> watch::Receiver<DetectionState> {
        self.state.clone()
    }

    /// Handle for the detector to report results through.
    pub fn sender(&self) -> DetectionSender {
        self.events.clone()
    }

    /// Fail with [`PreconditionError::NoHandDetected`] unless a hand is present.
    pub fn require_hand(&self, action: &'static str) -> Result<DetectionState, PreconditionError> {
        let state = self.current_state();
        if state.is_active {
            Ok(state)
        } else {
            Err(PreconditionError::NoHandDetected(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_event_wins() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (gate, _handle) = DetectionGate::spawn(shutdown_rx);
        let mut rx = gate.subscribe();

        let sender = gate.sender();
        assert!(sender.send(DetectionEvent::with_hands(1)));
        assert!(sender.send(DetectionEvent::empty()));
        assert!(sender.send(DetectionEvent::with_hands(2)));

        rx.wait_for(|s| s.hands_present == 2).await.unwrap();
        let state = gate.current_state();
        assert!(state.is_active);
        assert_eq!(state.hands_present, 2);
    }

    #[tokio::test]
    async fn require_hand_fails_without_hands() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (gate, _handle) = DetectionGate::spawn(shutdown_rx);

        assert_eq!(
            gate.require_hand("capture"),
            Err(PreconditionError::NoHandDetected("capture"))
        );

        gate.sender().send(DetectionEvent::with_hands(1));
        gate.subscribe().wait_for(|s| s.is_active).await.unwrap();
        assert!(gate.require_hand("capture").is_ok());
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (gate, handle) = DetectionGate::spawn(shutdown_rx);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(!gate.sender().send(DetectionEvent::with_hands(1)));
    }
}
