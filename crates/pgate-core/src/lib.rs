//! Core domain types for the order policy gate.
//!
//! This crate provides the records exchanged with the gate:
//! - `OrderIntent`, `OrderSide`: the proposed order as seen by policy checks
//! - `Decision`, `ReasonCode`: the auditable allow/deny outcome
//! - `PolicyConfig`: limits, guards and the kill switch
//! - `PolicyVersion`: config epoch stamped on every decision

pub mod config;
pub mod decision;
pub mod order;

pub use config::{GuardsConfig, LimitsConfig, PolicyConfig, DEFAULT_RATE_PER_SEC};
pub use decision::{Decision, PolicyVersion, ReasonCode, DECISION_TTL_MS};
pub use order::{decimal_from_value, normalize_symbol, OrderIntent, OrderSide};
