//! Policy decision gate for outbound orders.
//!
//! Every order passes through one ordered pipeline before it may reach an
//! exchange. The first rule that decides wins:
//! 1. Kill switch (close-only orders are still allowed)
//! 2. Global halt
//! 3. Symbol halt
//! 4. Rate limit (applies to close-only orders too)
//! 5. Safe mode
//! 6. Data staleness
//! 7. Max order notional
//! 8. Close-only allow
//! 9. Pass
//!
//! Also provides:
//! - RateLimiter: fixed-window per-second admission counter
//! - PolicyState: halts, safe mode, config and version owned by the gate
//! - PolicySnapshot / PolicyUpdate: read and write views for administration

pub mod gate;
pub mod rate_limiter;
pub mod state;

pub use gate::PolicyGate;
pub use rate_limiter::RateLimiter;
pub use state::{PolicySnapshot, PolicyState, PolicyUpdate, SymbolHalt, SNAPSHOT_TTL_MS};
