//! Model Types

use serde::{Deserialize, Serialize};

/// A trained model as listed by `GET /api/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    /// Validation accuracy in `[0, 1]`.
    #[serde(default)]
    pub accuracy: f64,
    /// Number of samples the model was trained on.
    #[serde(rename = "n_samples", default)]
    pub sample_count: u64,
    #[serde(default)]
    pub classes: Vec<String>,
}

impl Model {
    /// Accuracy as a percentage, rounded to two decimals.
    pub fn accuracy_percent(&self) -> f64 {
        (self.accuracy * 10_000.0).round() / 100.0
    }
}

/// Response of `GET /api/models`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<Model>,
}

/// Response of `POST /api/train`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub accuracy: f64,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_list() {
        let json = r#"{"models":[{"name":"v1","accuracy":0.9123,"n_samples":120,"classes":["A","E"]}]}"#;
        let list: ModelList = serde_json::from_str(json).unwrap();
        assert_eq!(list.models.len(), 1);
        let model = &list.models[0];
        assert_eq!(model.name, "v1");
        assert_eq!(model.sample_count, 120);
        assert_eq!(model.classes, vec!["A", "E"]);
        assert!((model.accuracy_percent() - 91.23).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_models_field_is_empty() {
        let list: ModelList = serde_json::from_str("{}").unwrap();
        assert!(list.models.is_empty());
    }
}
