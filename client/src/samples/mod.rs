//! Background sample inventory refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::network::ApiClient;
use crate::session::SessionState;

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Poll `GET /api/samples` every `period` until shutdown.
///
/// Failures are logged and otherwise ignored; the next tick tries again.
/// A zero `period` is raised to one second.
pub fn start_inventory_refresh(
    api: Arc<ApiClient>,
    session: SessionState,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match api.sample_inventory().await {
                Ok(inventory) => session.set_inventory(inventory),
                Err(e) => debug!(error = %e, "Sample inventory refresh failed"),
            }
        }

        info!("Inventory refresh stopped");
    })
}
