//! Prometheus metrics for the policy gate.
//!
//! # Panics
//!
//! Metric registration panics on failure (e.g. a duplicate metric name).
//! This can only happen while a static is first initialized.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_gauge, CounterVec, Encoder, Histogram,
    IntGauge, TextEncoder,
};

use pgate_core::Decision;

use crate::error::TelemetryResult;

/// Decisions by outcome and reason.
/// Labels: outcome (allow/deny), reason (reason code)
pub static DECISIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pgate_decisions_total",
        "Total gate decisions",
        &["outcome", "reason"]
    )
    .unwrap()
});

/// Evaluation latency in microseconds.
pub static EVALUATE_LATENCY_US: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "pgate_evaluate_latency_us",
        "Gate evaluation latency in microseconds",
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 250.0, 1000.0]
    )
    .unwrap()
});

/// Active policy version.
pub static POLICY_VERSION: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pgate_policy_version", "Active policy config version").unwrap()
});

/// Global halt state (1 = halted).
pub static GLOBAL_HALT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pgate_global_halt", "Global halt state (1=halted)").unwrap()
});

/// Safe mode state (1 = on).
pub static SAFE_MODE: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("pgate_safe_mode", "Safe mode state (1=on)").unwrap());

/// Kill switch state (1 = on).
pub static KILL_SWITCH: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("pgate_kill_switch", "Kill switch state (1=on)").unwrap());

/// Number of halted symbols.
pub static HALTED_SYMBOLS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pgate_halted_symbols", "Number of halted symbols").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record one gate decision.
    pub fn decision(decision: &Decision) {
        let outcome = if decision.is_allow() { "allow" } else { "deny" };
        DECISIONS_TOTAL
            .with_label_values(&[outcome, decision.reason().as_str()])
            .inc();
    }

    /// Record evaluation latency.
    pub fn evaluate_latency(latency_us: f64) {
        EVALUATE_LATENCY_US.observe(latency_us);
    }

    /// Publish the policy state gauges.
    pub fn policy_state(
        version: u64,
        global_halt: bool,
        safe_mode: bool,
        kill_switch: bool,
        halted_symbols: usize,
    ) {
        POLICY_VERSION.set(i64::try_from(version).unwrap_or(i64::MAX));
        GLOBAL_HALT.set(i64::from(global_halt));
        SAFE_MODE.set(i64::from(safe_mode));
        KILL_SWITCH.set(i64::from(kill_switch));
        HALTED_SYMBOLS.set(i64::try_from(halted_symbols).unwrap_or(i64::MAX));
    }

    /// Encode the default registry in Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
