use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use styx_core::partition::PartitionState;
use styx_core::{Belief, NodeId, Oracle};

use crate::config::DaemonConfig;
use crate::telemetry::Telemetry;

#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<Oracle>,
    pub telemetry: Telemetry,
}

/// JSON shape of a query response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub target: u64,
    pub alive_confidence: f64,
    pub dead_confidence: f64,
    pub unknown: f64,
    pub refused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,
    pub dead: bool,
    pub witness_count: usize,
    pub disagreement: f64,
    pub partition_state: String,
    pub evidence: Vec<String>,
}

/// JSON shape of a witness report submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub witness: u64,
    pub target: u64,
    pub alive: f64,
    pub dead: f64,
    pub unknown: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterWitnessRequest {
    pub id: u64,
}

/// A failed request, mapped onto a status code and a JSON error body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: AppState, cfg: &DaemonConfig) -> Router {
    Router::new()
        .route("/query", get(handle_query))
        .route("/report", post(handle_report))
        .route("/witnesses", post(handle_register_witness))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .layer(RequestBodyLimitLayer::new(cfg.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cfg: &DaemonConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state, cfg))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let response = query_impl(&state, params.get("target").map(String::as_str))?;
    Ok((StatusCode::OK, Json(response)))
}

async fn handle_report(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    report_impl(&state, &body)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

async fn handle_register_witness(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    register_witness_impl(&state, &body)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "registered" })),
    ))
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "styx" }))
}

async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        state.telemetry.render_prometheus(),
    )
}

/// Query the oracle. Refusals are a first-class outcome, so the response is
/// always 200 once the target id parses.
pub fn query_impl(state: &AppState, target: Option<&str>) -> Result<QueryResponse, ApiError> {
    let target = target.ok_or_else(|| ApiError::bad_request("missing target parameter"))?;
    let target_id: u64 = target
        .parse()
        .map_err(|_| ApiError::bad_request("invalid target id"))?;

    let result = state.oracle.query(NodeId::new(target_id));

    state.telemetry.record_query(result.refused);
    if result.partition_state == PartitionState::ConfirmedPartition {
        state.telemetry.record_partition();
    }

    Ok(QueryResponse {
        target: target_id,
        alive_confidence: result.belief.alive().value(),
        dead_confidence: result.belief.dead().value(),
        unknown: result.belief.unknown().value(),
        refused: result.refused,
        refusal_reason: result.refusal_reason,
        dead: result.dead,
        witness_count: result.witness_count,
        disagreement: result.disagreement,
        partition_state: result.partition_state.to_string(),
        evidence: result.evidence,
    })
}

/// Ingest a witness report. The belief is validated before it reaches the
/// core; a bad sum or out-of-range mass is a 400.
pub fn report_impl(state: &AppState, body: &[u8]) -> Result<(), ApiError> {
    let req: ReportRequest =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("invalid json"))?;

    let belief = Belief::new(req.alive, req.dead, req.unknown)
        .map_err(|err| ApiError::bad_request(format!("invalid belief: {err}")))?;

    state
        .oracle
        .receive_report(NodeId::new(req.witness), NodeId::new(req.target), belief);

    state.telemetry.record_report();
    state
        .telemetry
        .set_witness_count(state.oracle.registry().len() as u64);
    Ok(())
}

pub fn register_witness_impl(state: &AppState, body: &[u8]) -> Result<(), ApiError> {
    let req: RegisterWitnessRequest =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("invalid json"))?;

    state.oracle.register_witness(NodeId::new(req.id));
    state
        .telemetry
        .set_witness_count(state.oracle.registry().len() as u64);
    Ok(())
}
