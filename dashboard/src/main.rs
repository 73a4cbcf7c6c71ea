mod errors;
mod poller;
mod state;
#[cfg(test)]
mod testutil;
mod transport;
mod web;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use agridash_common::{BoolCoercion, DashboardConfig};

use crate::poller::Poller;
use crate::state::DashboardState;
use crate::transport::GatewayClient;
use crate::web::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = config_from_env();
    config.sanitize();

    let client = Arc::new(GatewayClient::new(config.gateway_base_url.clone()));
    let dashboard = Arc::new(Mutex::new(DashboardState::new(config.bool_coercion)));
    let poller = Poller::spawn(client.clone(), dashboard.clone(), &config);

    let web_root = std::env::var("DASHBOARD_WEB_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/web")));

    let app = web::router(
        AppState {
            dashboard,
            client,
            timezone: Arc::new(config.timezone.clone()),
        },
        web_root,
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port)
        .parse()
        .context("invalid dashboard listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind dashboard server at {addr}"))?;

    info!(gateway = %config.gateway_base_url, "dashboard listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to install ctrl-c handler: {err}");
    }
}

fn config_from_env() -> DashboardConfig {
    let defaults = DashboardConfig::default();
    DashboardConfig {
        gateway_base_url: std::env::var("GATEWAY_BASE_URL").unwrap_or(defaults.gateway_base_url),
        node_id: env_parse("DASHBOARD_NODE_ID").unwrap_or(defaults.node_id),
        history_minutes: env_parse("DASHBOARD_HISTORY_MINUTES").unwrap_or(defaults.history_minutes),
        poll_period_secs: env_parse("DASHBOARD_POLL_SECS").unwrap_or(defaults.poll_period_secs),
        http_port: env_parse("DASHBOARD_HTTP_PORT").unwrap_or(defaults.http_port),
        timezone: std::env::var("DASHBOARD_TIMEZONE").unwrap_or(defaults.timezone),
        bool_coercion: std::env::var("DASHBOARD_BOOL_COERCION")
            .ok()
            .and_then(|raw| BoolCoercion::parse(&raw))
            .unwrap_or(defaults.bool_coercion),
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}
