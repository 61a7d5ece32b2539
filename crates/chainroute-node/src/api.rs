//! HTTP API server for the Chainroute node.
//!
//! Provides REST endpoints for routing payments, network status, merchant
//! preferences, simulation, recommendations and analytics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use chainroute_core::{is_fresh, NetworkState, Urgency};
use chainroute_monitor::MonitorError;
use chainroute_routing::{
    AnalyticsSummary, CustomerPreferences, PreferencesUpdate, RecommendationReport,
    RouteRequest, RoutingDecision, RoutingError, RoutingPreferences, SimulationResult,
    SimulationScenario, TimeRange,
};

use crate::state::AppState;

// --- Request / response types ---

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Deserialize)]
pub struct OptimalRoutingRequest {
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub customer_preferences: Option<CustomerPreferences>,
}

#[derive(Serialize)]
pub struct NetworkStatusEntry {
    #[serde(flatten)]
    pub state: NetworkState,
    pub fresh: bool,
}

#[derive(Serialize)]
pub struct NetworkStatusResponse {
    pub networks: Vec<NetworkStatusEntry>,
    pub fresh_count: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub monitoring: bool,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub network: String,
    pub reliability: f64,
}

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Deserialize)]
pub struct SimulateRequest {
    pub scenarios: Vec<SimulationScenario>,
}

#[derive(Serialize)]
pub struct SimulateResponse {
    pub results: Vec<SimulationResult>,
}

#[derive(Deserialize)]
pub struct RecommendationsQuery {
    pub amount: f64,
    #[serde(default)]
    pub urgency: Option<String>,
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn routing_error(e: RoutingError) -> ApiError {
    if e.is_invalid_input() {
        error(StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!(error = %e, "routing request failed");
        error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

// --- Handlers ---

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

async fn handle_optimal_routing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OptimalRoutingRequest>,
) -> Result<Json<RoutingDecision>, ApiError> {
    let request = RouteRequest::parse(
        req.amount,
        &req.currency,
        req.urgency.as_deref(),
        req.merchant_id,
        req.customer_preferences,
    )
    .map_err(routing_error)?;
    let decision = state.engine.route(request).map_err(routing_error)?;
    Ok(Json(decision))
}

async fn handle_network_status(State(state): State<Arc<AppState>>) -> Json<NetworkStatusResponse> {
    let status = state.monitor.status();
    let now = Utc::now();
    let networks: Vec<NetworkStatusEntry> = status
        .networks
        .into_iter()
        .map(|s| NetworkStatusEntry {
            fresh: is_fresh(&s, now),
            state: s,
        })
        .collect();
    let fresh_count = networks.iter().filter(|n| n.fresh).count();
    Json(NetworkStatusResponse {
        networks,
        fresh_count,
        last_update: status.last_update,
        monitoring: status.monitoring,
    })
}

async fn handle_reset_reliability(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ResetResponse>, ApiError> {
    match state.monitor.reset_reliability(&key) {
        Ok(reliability) => Ok(Json(ResetResponse {
            network: key,
            reliability,
        })),
        Err(MonitorError::UnknownNetwork(key)) => Err(error(
            StatusCode::NOT_FOUND,
            format!("unknown network: {key}"),
        )),
        Err(e) => Err(error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn handle_analytics(
    State(state): State<Arc<AppState>>,
    Path(merchant): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let range = match query.range.as_deref() {
        Some(r) => r.parse::<TimeRange>().map_err(routing_error)?,
        None => TimeRange::default(),
    };
    Ok(Json(state.engine.analytics(&merchant, range)))
}

async fn handle_set_preferences(
    State(state): State<Arc<AppState>>,
    Path(merchant): Path<String>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<RoutingPreferences>, ApiError> {
    let prefs = state
        .engine
        .set_preferences(&merchant, update)
        .map_err(routing_error)?;
    Ok(Json(prefs))
}

async fn handle_get_preferences(
    State(state): State<Arc<AppState>>,
    Path(merchant): Path<String>,
) -> Json<RoutingPreferences> {
    Json(state.engine.preferences(&merchant))
}

async fn handle_simulate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let results = state
        .engine
        .simulate(&req.scenarios)
        .map_err(routing_error)?;
    Ok(Json(SimulateResponse { results }))
}

async fn handle_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<RecommendationReport>, ApiError> {
    let urgency = match query.urgency.as_deref() {
        Some(u) => u
            .parse::<Urgency>()
            .map_err(|e| routing_error(e.into()))?,
        None => Urgency::default(),
    };
    let report = state
        .engine
        .recommendations(query.amount, urgency)
        .map_err(routing_error)?;
    Ok(Json(report))
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/routing/optimal", post(handle_optimal_routing))
        .route("/api/v1/routing/simulate", post(handle_simulate))
        .route("/api/v1/routing/recommendations", get(handle_recommendations))
        .route("/api/v1/routing/analytics/{merchant}", get(handle_analytics))
        .route("/api/v1/networks/status", get(handle_network_status))
        .route("/api/v1/networks/{key}/reset", post(handle_reset_reliability))
        .route(
            "/api/v1/merchants/{merchant}/preferences",
            get(handle_get_preferences).put(handle_set_preferences),
        )
        .with_state(state)
}

pub async fn start_api_server(listen_addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(listen_addr = %listener.local_addr()?, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
