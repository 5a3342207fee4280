//! HTTP server implementation using axum.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use pgate_core::{Decision, OrderIntent};
use pgate_policy::{PolicyGate, PolicySnapshot, PolicyUpdate};
use pgate_telemetry::Metrics;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    HealthResponse, Market, OrderAccepted, OrderNotPlaced, OrderRejected, OrderRequest,
};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    gate: Arc<PolicyGate>,
    config: ServerConfig,
}

impl AppState {
    pub fn new(gate: Arc<PolicyGate>, config: ServerConfig) -> Self {
        Self { gate, config }
    }

    pub fn gate(&self) -> &Arc<PolicyGate> {
        &self.gate
    }

    /// Run the gate and record the outcome.
    fn evaluate(&self, order: &OrderIntent) -> Decision {
        let started = Instant::now();
        let decision = self.gate.evaluate(order);
        Metrics::evaluate_latency(started.elapsed().as_secs_f64() * 1_000_000.0);
        Metrics::decision(&decision);
        decision
    }

    fn publish_policy_gauges(&self, snapshot: &PolicySnapshot) {
        Metrics::policy_state(
            snapshot.version.get(),
            snapshot.global_halt,
            snapshot.safe_mode,
            snapshot.kill_switch,
            snapshot.halted_symbols.len(),
        );
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/policy/snapshot", get(policy_snapshot))
        .route("/policy/update", post(policy_update))
        .route("/policy/evaluate", post(policy_evaluate))
        .route("/spot/market-order", post(spot_market_order))
        .route("/mix/market-order", post(mix_market_order))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Decode a JSON body. An empty body decodes as `T::default()`.
fn decode_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    state.publish_policy_gauges(&state.gate.snapshot());
    let text = Metrics::render()?;
    Ok(([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], text).into_response())
}

async fn policy_snapshot(State(state): State<AppState>) -> Json<PolicySnapshot> {
    Json(state.gate.snapshot())
}

async fn policy_update(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PolicySnapshot>> {
    let update: PolicyUpdate = decode_body(&body)?;
    if update.is_empty() {
        debug!("Empty policy update");
        let snapshot = state.gate.snapshot();
        state.publish_policy_gauges(&snapshot);
        return Ok(Json(snapshot));
    }
    let replaces_config = update.config.is_some();
    let snapshot = state.gate.apply(update);
    if replaces_config {
        info!(version = %snapshot.version, "Policy config updated via API");
    }
    state.publish_policy_gauges(&snapshot);
    Ok(Json(snapshot))
}

async fn policy_evaluate(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Decision>> {
    let order: OrderIntent = decode_body(&body)?;
    Ok(Json(state.evaluate(&order)))
}

async fn spot_market_order(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    market_order(&state, Market::Spot, &body)
}

async fn mix_market_order(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    market_order(&state, Market::Mix, &body)
}

/// Gate a market order. Allowed orders are never forwarded.
fn market_order(state: &AppState, market: Market, body: &Bytes) -> ApiResult<Response> {
    let request: OrderRequest = decode_body(body)?;
    let order = request.into_intent();
    let decision = state.evaluate(&order);

    if decision.is_deny() {
        info!(
            %market,
            symbol = %order.normalized_symbol(),
            reason = %decision.reason(),
            "Order blocked by policy"
        );
        let body = OrderRejected {
            ok: false,
            decision,
        };
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }

    if state.config.dry_run {
        info!(
            %market,
            symbol = %order.normalized_symbol(),
            notional = %order.notional,
            reason = %decision.reason(),
            "Order allowed (dry run)"
        );
        let body = OrderAccepted {
            ok: true,
            dry_run: true,
            market,
            decision,
        };
        return Ok((StatusCode::OK, Json(body)).into_response());
    }

    warn!(%market, "Order allowed but live placement is not available");
    let body = OrderNotPlaced {
        ok: false,
        error: "live order placement is not available; enable dry_run".to_string(),
        decision,
    };
    Ok((StatusCode::NOT_IMPLEMENTED, Json(body)).into_response())
}

/// Run the HTTP server until `shutdown` resolves.
pub async fn run_server<F>(gate: Arc<PolicyGate>, config: ServerConfig, shutdown: F) -> ApiResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_addr();
    let dry_run = config.dry_run;
    let state = AppState::new(gate, config);
    state.publish_policy_gauges(&state.gate.snapshot());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(addr = %addr, dry_run, "Starting policy gate server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ApiError::Serve)?;

    info!("Policy gate server stopped");
    Ok(())
}
