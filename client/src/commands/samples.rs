//! Sample inventory commands.

use sd_common::SampleInventory;
use tracing::info;

use super::reported;
use crate::error::PipelineError;
use crate::AppState;

/// Fetch per-class sample counts now, outside the periodic refresh.
#[tracing::instrument(skip(state))]
pub async fn fetch_samples(state: &AppState) -> Result<SampleInventory, PipelineError> {
    let inventory = reported(
        &state.session,
        state.api.sample_inventory().await.map_err(PipelineError::from),
    )?;
    state.session.set_inventory(inventory.clone());
    Ok(inventory)
}

/// Delete every stored sample on the service.
#[tracing::instrument(skip(state))]
pub async fn clear_samples(state: &AppState) -> Result<(), PipelineError> {
    reported(
        &state.session,
        state.api.clear_samples().await.map_err(PipelineError::from),
    )?;
    info!("All samples cleared");
    state.session.set_inventory(SampleInventory::default());
    state.session.success("All samples deleted");
    Ok(())
}
