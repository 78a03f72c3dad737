//! Sample Inventory Types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-class sample counts held by the remote store (`GET /api/samples`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInventory {
    #[serde(default)]
    pub total_samples: u64,
    #[serde(default)]
    pub samples_per_class: BTreeMap<String, u64>,
}

impl SampleInventory {
    /// Count one accepted sample for `label`.
    pub fn record(&mut self, label: &str) {
        self.total_samples += 1;
        *self.samples_per_class.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Samples stored for `label`.
    pub fn count_for(&self, label: &str) -> u64 {
        self.samples_per_class.get(label).copied().unwrap_or(0)
    }

    /// Number of distinct classes with at least one sample.
    pub fn class_count(&self) -> usize {
        self.samples_per_class.values().filter(|&&n| n > 0).count()
    }
}

/// Response of `POST /api/upload_sample`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_updates_total_and_class() {
        let mut inv = SampleInventory::default();
        inv.record("A");
        inv.record("A");
        inv.record("5");
        assert_eq!(inv.total_samples, 3);
        assert_eq!(inv.count_for("A"), 2);
        assert_eq!(inv.count_for("5"), 1);
        assert_eq!(inv.count_for("Z"), 0);
        assert_eq!(inv.class_count(), 2);
    }

    #[test]
    fn parses_inventory_with_defaults() {
        let inv: SampleInventory =
            serde_json::from_str(r#"{"total_samples":4,"samples_per_class":{"A":3,"B":1}}"#)
                .unwrap();
        assert_eq!(inv.total_samples, 4);
        assert_eq!(inv.count_for("B"), 1);

        let empty: SampleInventory = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SampleInventory::default());
    }

    #[test]
    fn upload_status() {
        let ok: UploadResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(ok.is_success());
        let err: UploadResponse =
            serde_json::from_str(r#"{"status":"error","message":"bad image"}"#).unwrap();
        assert!(!err.is_success());
        assert_eq!(err.message.as_deref(), Some("bad image"));
    }
}
