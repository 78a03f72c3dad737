//! Model Commands
//!
//! Prediction, training and model management against the remote service.

use sd_common::{Model, Prediction, TrainResponse};
use tracing::info;

use super::reported;
use crate::error::{PipelineError, PreconditionError};
use crate::AppState;

/// Classify the current frame with the selected model.
#[tracing::instrument(skip(state))]
pub async fn predict_once(state: &AppState) -> Result<Prediction, PipelineError> {
    let prediction = reported(&state.session, classify_current(state).await)?;
    if let Some(top) = prediction.top() {
        info!(class = %top.class, confidence = top.confidence, "Prediction");
        state.session.success(format!(
            "Prediction: {} ({:.1}%)",
            top.class,
            top.confidence * 100.0
        ));
    }
    state.session.set_prediction(prediction.clone());
    Ok(prediction)
}

async fn classify_current(state: &AppState) -> Result<Prediction, PipelineError> {
    state.detection.require_hand("predict")?;
    let model = state.session.model_name();
    if model.is_empty() {
        return Err(PreconditionError::EmptyModelName.into());
    }
    let image = state.encoder.encode_current(&state.camera).await?;
    Ok(state.api.predict(image, &model).await?)
}

/// Train a model on the stored samples and refresh the model list.
#[tracing::instrument(skip(state))]
pub async fn train_model(state: &AppState, name: &str) -> Result<TrainResponse, PipelineError> {
    let name = name.trim();
    let response = reported(&state.session, train_checked(state, name).await)?;
    info!(model = %name, accuracy = response.accuracy, "Model trained");
    state.session.set_model_name(name);
    state.session.success(format!(
        "Model trained successfully. Accuracy: {:.2}%",
        response.accuracy * 100.0
    ));

    // The new model shows up in the list; a failed refresh is already reported.
    let _ = fetch_models(state).await;
    Ok(response)
}

async fn train_checked(state: &AppState, name: &str) -> Result<TrainResponse, PipelineError> {
    if name.is_empty() {
        return Err(PreconditionError::EmptyModelName.into());
    }
    let have = state.session.inventory().total_samples;
    let needed = state.config.min_training_samples;
    if have < needed {
        return Err(PreconditionError::NotEnoughSamples { have, needed }.into());
    }
    Ok(state.api.train(name).await?)
}

/// Refresh the cached model list.
#[tracing::instrument(skip(state))]
pub async fn fetch_models(state: &AppState) -> Result<Vec<Model>, PipelineError> {
    let models = reported(
        &state.session,
        state.api.list_models().await.map_err(PipelineError::from),
    )?;
    state.session.set_models(models.clone());
    Ok(models)
}

/// Delete a model and refresh the list.
#[tracing::instrument(skip(state))]
pub async fn delete_model(state: &AppState, name: &str) -> Result<(), PipelineError> {
    reported(
        &state.session,
        state.api.delete_model(name).await.map_err(PipelineError::from),
    )?;
    info!(model = %name, "Model deleted");
    state.session.success(format!("Model '{name}' deleted"));
    let _ = fetch_models(state).await;
    Ok(())
}

/// Choose the model used by [`predict_once`].
pub fn select_model(state: &AppState, name: &str) -> Result<(), PipelineError> {
    let result: Result<(), PipelineError> = if name.trim().is_empty() {
        Err(PreconditionError::EmptyModelName.into())
    } else {
        state.session.set_model_name(name);
        Ok(())
    };
    reported(&state.session, result)
}
