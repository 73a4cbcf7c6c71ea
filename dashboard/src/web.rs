use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Offset;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tracing::warn;

use crate::state::DashboardState;
use crate::transport::GatewayClient;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<DashboardState>>,
    pub client: Arc<GatewayClient>,
    pub timezone: Arc<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    key: String,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ScheduleFieldUpdate {
    field: String,
    value: Value,
}

pub fn router(state: AppState, web_root: PathBuf) -> Router {
    Router::new()
        .route("/api/dashboard", get(handle_get_dashboard))
        .route("/api/controls/toggle", post(handle_toggle))
        .route("/api/controls/field", post(handle_set_field))
        .route("/api/schedule/field", post(handle_set_schedule_field))
        .route("/api/charts/toggle", post(handle_toggle_charts))
        .route("/api/submit", post(handle_submit))
        .fallback_service(ServeDir::new(web_root))
        .with_state(state)
}

async fn handle_get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let view = {
        let dashboard = state.dashboard.lock().await;
        dashboard.view(Instant::now(), now_in_timezone(&state.timezone))
    };
    Json(view)
}

async fn handle_toggle(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(key) = params.get("key") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'key' parameter");
    };

    {
        let mut dashboard = state.dashboard.lock().await;
        if let Err(message) = dashboard.toggle(key) {
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    }

    handle_get_dashboard(State(state)).await.into_response()
}

async fn handle_set_field(
    State(state): State<AppState>,
    Json(update): Json<FieldUpdate>,
) -> impl IntoResponse {
    {
        let mut dashboard = state.dashboard.lock().await;
        if let Err(message) = dashboard.set_field(&update.key, &update.value) {
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    }

    handle_get_dashboard(State(state)).await.into_response()
}

async fn handle_set_schedule_field(
    State(state): State<AppState>,
    Json(update): Json<ScheduleFieldUpdate>,
) -> impl IntoResponse {
    {
        let mut dashboard = state.dashboard.lock().await;
        if let Err(message) = dashboard.set_schedule_field(&update.field, &update.value) {
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    }

    handle_get_dashboard(State(state)).await.into_response()
}

async fn handle_toggle_charts(State(state): State<AppState>) -> impl IntoResponse {
    {
        let mut dashboard = state.dashboard.lock().await;
        dashboard.toggle_charts();
    }

    handle_get_dashboard(State(state)).await.into_response()
}

/// Builds the desired-state document from the current controls and pushes it
/// to the gateway shadow. Fetch-path errors stay on the page; a submit
/// failure is the caller's problem, reported as 502.
async fn handle_submit(State(state): State<AppState>) -> impl IntoResponse {
    let desired = {
        let dashboard = state.dashboard.lock().await;
        dashboard.desired_state()
    };

    match state.client.submit_desired_state(&desired).await {
        Ok(_) => {
            let mut dashboard = state.dashboard.lock().await;
            dashboard.mark_submit_success(Instant::now());
        }
        Err(err) => {
            warn!("shadow update failed: {err}");
            return error_response(StatusCode::BAD_GATEWAY, "Failed to update shadow");
        }
    }

    handle_get_dashboard(State(state)).await.into_response()
}

fn now_in_timezone(timezone: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    let tz: Tz = timezone.parse().ok()?;
    let local = chrono::Utc::now().with_timezone(&tz);
    Some(local.with_timezone(&local.offset().fix()))
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
