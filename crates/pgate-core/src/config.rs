//! Policy configuration.
//!
//! Every field is optional on the wire; missing fields take the defaults
//! below. Non-positive limits never fail to load: a rate of 0 or less means
//! the default ceiling, a cap or staleness limit of 0 or less is disabled.
//! A config is immutable once handed to the gate.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Requests per second admitted when no (or a non-positive) rate limit is configured.
pub const DEFAULT_RATE_PER_SEC: u32 = 5;

/// Request and order-size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Evaluations admitted per wall-clock second. 0 falls back to the default.
    #[serde(
        default = "default_rate_per_sec",
        deserialize_with = "non_negative_u32"
    )]
    pub rate_per_sec: u32,
    /// Maximum order notional in USDT. 0 or less disables the cap.
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub max_order_usdt: Decimal,
}

fn default_rate_per_sec() -> u32 {
    DEFAULT_RATE_PER_SEC
}

/// Reads any integer; negatives become 0.
fn non_negative_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}

/// Reads any integer; negatives become 0.
fn non_negative_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.max(0).unsigned_abs())
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_per_sec: default_rate_per_sec(),
            max_order_usdt: Decimal::ZERO,
        }
    }
}

impl LimitsConfig {
    /// Ceiling the rate limiter should enforce.
    pub fn effective_rate_per_sec(&self) -> u32 {
        if self.rate_per_sec == 0 {
            DEFAULT_RATE_PER_SEC
        } else {
            self.rate_per_sec
        }
    }

    /// Notional cap, if enabled.
    pub fn order_cap(&self) -> Option<Decimal> {
        (self.max_order_usdt > Decimal::ZERO).then_some(self.max_order_usdt)
    }
}

/// Data freshness guards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardsConfig {
    /// Maximum time since the previous evaluation, in ms. 0 disables the guard.
    #[serde(default, deserialize_with = "non_negative_u64")]
    pub max_staleness_ms: u64,
}

impl GuardsConfig {
    pub fn staleness_limit_ms(&self) -> Option<u64> {
        (self.max_staleness_ms > 0).then_some(self.max_staleness_ms)
    }
}

/// Runtime policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub guards: GuardsConfig,
    /// Deny everything except close-only orders.
    #[serde(default)]
    pub kill_switch: bool,
    /// Admit an empty order record before any rule runs.
    ///
    /// Security-sensitive: an empty order should not normally reach the gate.
    #[serde(default)]
    pub empty_order_pass: bool,
}
