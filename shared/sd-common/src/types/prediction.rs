//! Prediction Types

use serde::{Deserialize, Serialize};

/// One candidate class with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class: String,
    pub confidence: f64,
}

/// Response of `POST /api/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f64,
    #[serde(default)]
    pub all_predictions: Vec<ClassScore>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Prediction {
    /// Sort candidates by descending confidence.
    ///
    /// If the service omitted the candidate list, the primary prediction
    /// becomes the only entry.
    #[must_use]
    pub fn ranked(mut self) -> Self {
        if self.all_predictions.is_empty() {
            self.all_predictions.push(ClassScore {
                class: self.prediction.clone(),
                confidence: self.confidence,
            });
        }
        self.all_predictions
            .sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        self
    }

    /// Highest-ranked candidate.
    pub fn top(&self) -> Option<&ClassScore> {
        self.all_predictions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_orders_by_confidence() {
        let json = r#"{
            "prediction": "B",
            "confidence": 0.7,
            "all_predictions": [
                {"class": "A", "confidence": 0.2},
                {"class": "B", "confidence": 0.7},
                {"class": "C", "confidence": 0.1}
            ]
        }"#;
        let p: Prediction = serde_json::from_str(json).unwrap();
        let p = p.ranked();
        let classes: Vec<_> = p.all_predictions.iter().map(|c| c.class.as_str()).collect();
        assert_eq!(classes, vec!["B", "A", "C"]);
        assert_eq!(p.top().unwrap().class, "B");
    }

    #[test]
    fn ranked_falls_back_to_primary() {
        let p: Prediction =
            serde_json::from_str(r#"{"prediction":"5","confidence":0.93}"#).unwrap();
        let p = p.ranked();
        assert_eq!(p.all_predictions.len(), 1);
        assert_eq!(p.top().unwrap().class, "5");
    }
}
