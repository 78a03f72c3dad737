//! Service API Client
//!
//! Thin `reqwest` wrapper over the REST surface:
//! `POST /api/upload_sample`, `POST /api/train`, `POST /api/predict`,
//! `GET /api/models`, `GET /api/samples`, `DELETE /api/clear_samples`,
//! `DELETE /api/model/{name}`.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Response};
use sd_common::{
    ErrorBody, Model, ModelList, Prediction, SampleInventory, TrainResponse, UploadResponse,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use super::ApiError;
use crate::upload::Sample;

/// Client for the remote service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `base_url` with a fixed per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/<segments...>`, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Store one labeled image.
    ///
    /// A response whose status is not `success` is reported as
    /// [`ApiError::RemoteValidation`].
    pub async fn upload_sample(&self, sample: &Sample) -> Result<UploadResponse, ApiError> {
        let file = Part::bytes(sample.payload.to_vec())
            .file_name("capture.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("file", file)
            .text("label", sample.label.clone());

        let response = self
            .http
            .post(self.endpoint(&["api", "upload_sample"])?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(sample = %sample.id, error = %e, "Upload request failed");
                ApiError::from(e)
            })?;

        let body: UploadResponse = read_json(response).await?;
        if body.is_success() {
            Ok(body)
        } else {
            Err(ApiError::RemoteValidation(body.message.unwrap_or_else(|| {
                format!("Upload rejected with status '{}'", body.status)
            })))
        }
    }

    /// Train a model named `name` on the stored samples.
    pub async fn train(&self, name: &str) -> Result<TrainResponse, ApiError> {
        let form = Form::new().text("name", name.to_string());
        let response = self
            .http
            .post(self.endpoint(&["api", "train"])?)
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    /// Classify one image with the model named `model`.
    pub async fn predict(&self, image: Bytes, model: &str) -> Result<Prediction, ApiError> {
        let file = Part::bytes(image.to_vec())
            .file_name("predict.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("file", file)
            .text("model", model.to_string());

        let response = self
            .http
            .post(self.endpoint(&["api", "predict"])?)
            .multipart(form)
            .send()
            .await?;
        let prediction: Prediction = read_json(response).await?;
        Ok(prediction.ranked())
    }

    pub async fn list_models(&self) -> Result<Vec<Model>, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "models"])?)
            .send()
            .await?;
        let list: ModelList = read_json(response).await?;
        Ok(list.models)
    }

    pub async fn sample_inventory(&self) -> Result<SampleInventory, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "samples"])?)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn clear_samples(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "clear_samples"])?)
            .send()
            .await?;
        check_status(response).await.map(drop)
    }

    pub async fn delete_model(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "model", name])?)
            .send()
            .await?;
        check_status(response).await.map(drop)
    }
}

/// Turn non-2xx responses into errors, surfacing the service's `detail`.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message())
        .unwrap_or_else(|| status.to_string());
    debug!(status = status.as_u16(), body = %body, "Request failed");

    Err(if status.is_client_error() {
        ApiError::RemoteValidation(message)
    } else {
        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
