//! Hand Detection
//!
//! Types exchanged with the external hand-landmark detector, and the
//! [`DetectionGate`] that reduces its results to a "hand present" signal.

mod gate;

pub use gate::{DetectionGate, DetectionSender};

use serde::{Deserialize, Serialize};

use crate::capture::Frame;

/// Options for the hand-landmark detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub max_num_hands: u32,
    pub model_complexity: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_num_hands: 2,
            model_complexity: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// A single normalized landmark (x/y in `[0, 1]` image space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// The landmark set of one detected hand (21 points).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub points: Vec<Landmark>,
}

/// One detector result, emitted per processed frame.
///
/// `None` and an empty list both mean "no hands".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub multi_hand_landmarks: Option<Vec<HandLandmarks>>,
}

impl DetectionEvent {
    /// An event reporting no hands.
    pub const fn empty() -> Self {
        Self {
            multi_hand_landmarks: None,
        }
    }

    /// An event reporting `count` hands with empty landmark sets.
    pub fn with_hands(count: usize) -> Self {
        Self {
            multi_hand_landmarks: Some(vec![HandLandmarks::default(); count]),
        }
    }
}

/// Latest observed hand state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionState {
    pub hands_present: u32,
    pub is_active: bool,
}

impl From<&DetectionEvent> for DetectionState {
    fn from(event: &DetectionEvent) -> Self {
        let hands_present = event
            .multi_hand_landmarks
            .as_ref()
            .map_or(0, |hands| hands.len() as u32);
        Self {
            hands_present,
            is_active: hands_present > 0,
        }
    }
}

/// External hand-landmark detector.
///
/// The frame source hands every frame to [`HandDetector::send`]; the detector
/// reports results whenever it has them, on any thread, through the
/// [`DetectionSender`] it is given.
pub trait HandDetector: Send + 'static {
    /// Apply detector options. Called once when the detector is registered.
    fn set_options(&mut self, _config: &DetectorConfig) {}

    /// Submit a frame for processing.
    fn send(&mut self, frame: &Frame, results: &DetectionSender);

    /// Release detector resources. Called when the camera stops.
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_from_event() {
        assert_eq!(
            DetectionState::from(&DetectionEvent::empty()),
            DetectionState::default()
        );

        let empty_list = DetectionEvent {
            multi_hand_landmarks: Some(Vec::new()),
        };
        assert!(!DetectionState::from(&empty_list).is_active);

        let two = DetectionState::from(&DetectionEvent::with_hands(2));
        assert_eq!(two.hands_present, 2);
        assert!(two.is_active);
    }
}
