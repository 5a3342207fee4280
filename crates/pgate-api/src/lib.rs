//! pgate-api - HTTP adapter for the order policy gate.
//!
//! Exposes one shared `PolicyGate` over axum:
//!
//! ```text
//! GET  /health             → {"status":"ok"}
//! GET  /metrics            → Prometheus text
//! GET  /policy/snapshot    → PolicySnapshot
//! POST /policy/update      → PolicyUpdate in, PolicySnapshot out
//! POST /policy/evaluate    → OrderIntent in, Decision out
//! POST /spot/market-order  → OrderRequest in, gated (dry-run only)
//! POST /mix/market-order   → OrderRequest in, gated (dry-run only)
//! ```
//!
//! No exchange leg exists behind the order routes: an allowed order is
//! answered as a dry run, or with 501 when dry-run is switched off.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use pgate_api::{run_server, ServerConfig};
//! use pgate_policy::PolicyGate;
//!
//! let gate = Arc::new(PolicyGate::new(policy_config));
//! run_server(gate, ServerConfig::default(), async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! ```

mod config;
mod error;
mod server;
mod types;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::{create_router, run_server, AppState};
pub use types::{
    ErrorBody, HealthResponse, Market, OrderAccepted, OrderNotPlaced, OrderRejected, OrderRequest,
};
