use serde::Serialize;
use serde_json::Value;

use agridash_common::{ChartSeries, DesiredStateDocument, TelemetryRecord};

use crate::errors::{Error, Result};

/// Thin client for the remote telemetry/shadow service. Pass-through with
/// response normalization only: no retries, no caching, no payload
/// validation beyond JSON decoding.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ShadowEnvelope<'a> {
    state: ShadowState<'a>,
}

#[derive(Debug, Serialize)]
struct ShadowState<'a> {
    desired: &'a DesiredStateDocument,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Fetches the newest telemetry record. The endpoint returns either an
    /// array of records (newest first) or a bare record object depending on
    /// the gateway revision; both are accepted, anything else is rejected.
    pub async fn fetch_latest(&self) -> Result<TelemetryRecord> {
        let body = self
            .http
            .get(format!("{}/latest", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        latest_record(decode_body(&body)?)
    }

    /// Fetches the history window used for charts, timestamps normalized to
    /// epoch milliseconds.
    pub async fn fetch_history(&self, node_id: u32, minutes: u32) -> Result<ChartSeries> {
        let body = self
            .http
            .get(format!("{}/latest", self.base_url))
            .query(&[("node_id", node_id), ("minutes", minutes)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        match decode_body(&body)? {
            value @ Value::Array(_) => {
                let records: Vec<TelemetryRecord> = serde_json::from_value(value)?;
                Ok(ChartSeries::from_records(&records))
            }
            other => Err(Error::MalformedResponse(format!(
                "expected history array, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Submits the desired-state document under the shadow envelope. The
    /// envelope is applied here and nowhere else; wrapping an already
    /// enveloped payload would nest state.desired twice upstream.
    pub async fn submit_desired_state(&self, desired: &DesiredStateDocument) -> Result<Value> {
        let response = self
            .http
            .put(format!("{}/shadow", self.base_url))
            .json(&ShadowEnvelope {
                state: ShadowState { desired },
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

/// Some gateway deployments double-encode responses: the body is a JSON
/// string that itself contains the document. Unwrap one level when so.
fn decode_body(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)?;
    if let Value::String(inner) = value {
        return Ok(serde_json::from_str(&inner)?);
    }
    Ok(value)
}

fn latest_record(value: Value) -> Result<TelemetryRecord> {
    match value {
        Value::Array(items) => {
            let newest = items.into_iter().next().ok_or(Error::NoTelemetry)?;
            Ok(serde_json::from_value(newest)?)
        }
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => Err(Error::MalformedResponse(format!(
            "expected record or array, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve;

    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::Mutex;

    use agridash_common::{build_desired_state, ControlState};

    #[tokio::test]
    async fn latest_takes_the_first_record_of_an_array() {
        let router = Router::new().route(
            "/latest",
            get(|| async {
                Json(json!([
                    { "node_id": 1, "soil_threshold": "35" },
                    { "node_id": 1, "soil_threshold": "30" }
                ]))
            }),
        );
        let client = GatewayClient::new(serve(router).await);

        let record = client.fetch_latest().await.unwrap();
        assert_eq!(record.soil_threshold.unwrap().as_f64(), Some(35.0));
    }

    #[tokio::test]
    async fn latest_accepts_a_bare_record_object() {
        let router = Router::new().route(
            "/latest",
            get(|| async { Json(json!({ "node_id": 2, "tank_pump": "true" })) }),
        );
        let client = GatewayClient::new(serve(router).await);

        let record = client.fetch_latest().await.unwrap();
        assert_eq!(record.node_id.unwrap().as_f64(), Some(2.0));
    }

    #[tokio::test]
    async fn latest_unwraps_a_double_encoded_body() {
        let router = Router::new().route(
            "/latest",
            get(|| async {
                // Body is a JSON *string* containing the document.
                Json(Value::String(r#"[{"node_id": 3}]"#.to_string()))
            }),
        );
        let client = GatewayClient::new(serve(router).await);

        let record = client.fetch_latest().await.unwrap();
        assert_eq!(record.node_id.unwrap().as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn empty_array_is_no_telemetry() {
        let router = Router::new().route("/latest", get(|| async { Json(json!([])) }));
        let client = GatewayClient::new(serve(router).await);

        assert!(matches!(
            client.fetch_latest().await,
            Err(Error::NoTelemetry)
        ));
    }

    #[tokio::test]
    async fn unexpected_shapes_are_rejected_loudly() {
        let router = Router::new().route("/latest", get(|| async { Json(json!(42)) }));
        let client = GatewayClient::new(serve(router).await);

        assert!(matches!(
            client.fetch_latest().await,
            Err(Error::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn history_passes_query_params_and_normalizes_timestamps() {
        let seen: Arc<Mutex<Option<HashMap<String, String>>>> = Arc::new(Mutex::new(None));
        let router = Router::new()
            .route(
                "/latest",
                get(
                    |State(seen): State<Arc<Mutex<Option<HashMap<String, String>>>>>,
                     Query(params): Query<HashMap<String, String>>| async move {
                        *seen.lock().await = Some(params);
                        Json(json!([
                            { "time": "2026-03-14T00:00:00Z", "temperature_c": 20 },
                            { "time": 1773446460000i64, "temperature_c": 21 }
                        ]))
                    },
                ),
            )
            .with_state(seen.clone());
        let client = GatewayClient::new(serve(router).await);

        let series = client.fetch_history(7, 120).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].time_ms, 1_773_446_400_000);
        assert_eq!(series.points[1].time_ms, 1_773_446_460_000);

        let params = seen.lock().await.clone().unwrap();
        assert_eq!(params.get("node_id").map(String::as_str), Some("7"));
        assert_eq!(params.get("minutes").map(String::as_str), Some("120"));
    }

    #[tokio::test]
    async fn submit_wraps_exactly_once() {
        let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let router = Router::new()
            .route(
                "/shadow",
                put(
                    |State(captured): State<Arc<Mutex<Option<Value>>>>,
                     Json(body): Json<Value>| async move {
                        *captured.lock().await = Some(body);
                        Json(json!({ "ok": true }))
                    },
                ),
            )
            .with_state(captured.clone());
        let client = GatewayClient::new(serve(router).await);

        let desired = build_desired_state(&ControlState::default());
        let ack = client.submit_desired_state(&desired).await.unwrap();
        assert_eq!(ack, json!({ "ok": true }));

        let body = captured.lock().await.clone().unwrap();
        let inner = &body["state"]["desired"];
        assert_eq!(inner["soil_threshold"], json!(40.0));
        assert_eq!(inner["poll_interval"], json!(60));
        // One envelope level only.
        assert!(inner.get("state").is_none());
        assert!(body["state"].get("state").is_none());
    }

    #[tokio::test]
    async fn submit_propagates_http_failures() {
        let router = Router::new().route(
            "/shadow",
            put(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = GatewayClient::new(serve(router).await);

        let desired = build_desired_state(&ControlState::default());
        assert!(matches!(
            client.submit_desired_state(&desired).await,
            Err(Error::Http(_))
        ));
    }
}
