//! Shared Types

mod category;
mod model;
mod prediction;
mod sample;

pub use category::*;
pub use model::*;
pub use prediction::*;
pub use sample::*;

use serde::{Deserialize, Serialize};

/// Error body returned by the remote service (`{"detail": ...}`).
///
/// `detail` is usually a string but validation failures carry a list of
/// objects, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable detail, if the body carried one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
