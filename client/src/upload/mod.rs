//! Upload Module
//!
//! Labeled samples and the FIFO queue that ships them to the sample store.

mod queue;

pub use queue::{DrainOutcome, UploadQueue};

use std::fmt;

use bytes::Bytes;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::network::{ApiClient, ApiError};

/// One labeled image destined for the training corpus. Immutable.
#[derive(Clone)]
pub struct Sample {
    /// Local identifier, used for logging only.
    pub id: Uuid,
    pub label: String,
    /// JPEG bytes.
    pub payload: Bytes,
}

impl Sample {
    pub fn new(label: impl Into<String>, payload: Bytes) -> Self {
        Self {
            id: Uuid::now_v7(),
            label: label.into(),
            payload,
        }
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Destination of queued samples.
pub trait SampleUploader: Send + Sync + 'static {
    fn upload<'a>(&'a self, sample: &'a Sample) -> BoxFuture<'a, Result<(), ApiError>>;
}

impl SampleUploader for ApiClient {
    fn upload<'a>(&'a self, sample: &'a Sample) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move { self.upload_sample(sample).await.map(drop) })
    }
}
