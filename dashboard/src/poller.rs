use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use agridash_common::DashboardConfig;

use crate::errors::Error;
use crate::state::{DashboardState, FETCH_ERROR_MESSAGE, NO_TELEMETRY_MESSAGE};
use crate::transport::GatewayClient;

/// Owned handle to the recurring telemetry poll. The task is scoped to this
/// handle: dropping into [`Poller::shutdown`] stops the timer and joins the
/// task. In-flight requests are not aborted; a late response dies with the
/// task.
pub struct Poller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(
        client: Arc<GatewayClient>,
        dashboard: Arc<Mutex<DashboardState>>,
        config: &DashboardConfig,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let period = Duration::from_secs(config.poll_period_secs);
        let node_id = config.node_id;
        let minutes = config.history_minutes;

        let handle = tokio::spawn(async move {
            // First tick fires immediately; a cycle awaits its own fetches,
            // so cycles never overlap.
            let mut ticker = tokio::time::interval(period);
            info!(
                period_secs = period.as_secs(),
                node_id, "telemetry poller started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poll_once(&client, &dashboard, node_id, minutes).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("telemetry poller stopped");
        });

        Self { shutdown, handle }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

async fn poll_once(
    client: &GatewayClient,
    dashboard: &Mutex<DashboardState>,
    node_id: u32,
    minutes: u32,
) {
    let record = match client.fetch_latest().await {
        Ok(record) => record,
        Err(err) => {
            warn!("latest telemetry fetch failed: {err}");
            dashboard.lock().await.mark_poll_failed(poll_error_message(&err));
            return;
        }
    };
    dashboard.lock().await.apply_latest(record);

    match client.fetch_history(node_id, minutes).await {
        Ok(series) => dashboard.lock().await.apply_history(series),
        Err(err) => {
            warn!("telemetry history fetch failed: {err}");
            dashboard.lock().await.mark_poll_failed(FETCH_ERROR_MESSAGE);
        }
    }
}

fn poll_error_message(err: &Error) -> &'static str {
    match err {
        Error::NoTelemetry | Error::MalformedResponse(_) | Error::Json(_) => NO_TELEMETRY_MESSAGE,
        Error::Http(_) => FETCH_ERROR_MESSAGE,
    }
}
