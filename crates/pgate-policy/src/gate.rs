//! Policy gate: the ordered decision pipeline.
//!
//! # Rule Order
//! 1. kill_switch - close-only orders allowed, everything else denied
//! 2. global_halt - close-only orders fall through
//! 3. symbol_halt - close-only orders fall through
//! 4. rate_limit - applies to every order, close-only included
//! 5. safe_mode - close-only orders fall through
//! 6. data_stale - close-only orders fall through
//! 7. max_order - close-only orders fall through
//! 8. close_only - terminal allow for close-only orders
//! 9. pass
//!
//! Reordering changes outcomes. In particular the kill switch must run
//! before the rate limit so an exhausted limiter never masks `KILL_SWITCH`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};

use pgate_core::{Decision, OrderIntent, PolicyConfig, PolicyVersion, ReasonCode};

use crate::state::{PolicySnapshot, PolicyState, PolicyUpdate};

/// Admission-control gate for outbound orders.
///
/// Thread-safe: share via `Arc<PolicyGate>`. Evaluations take a shared lock
/// on the policy state for their whole duration, so a concurrent config
/// replacement is seen either entirely or not at all.
#[derive(Debug)]
pub struct PolicyGate {
    state: RwLock<PolicyState>,
    /// Unix ms of the most recent evaluation. Staleness clock.
    last_evaluated_ms: AtomicI64,
}

impl PolicyGate {
    pub fn new(config: PolicyConfig) -> Self {
        Self::new_at(config, Utc::now())
    }

    /// Create a gate whose staleness clock starts at `now`.
    pub fn new_at(config: PolicyConfig, now: DateTime<Utc>) -> Self {
        Self {
            state: RwLock::new(PolicyState::new(config)),
            last_evaluated_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// Evaluate `order` against the current policy.
    pub fn evaluate(&self, order: &OrderIntent) -> Decision {
        self.evaluate_at(order, Utc::now())
    }

    /// Evaluate `order` as of `now`.
    ///
    /// Never blocks on I/O and never fails: every outcome is a [`Decision`].
    pub fn evaluate_at(&self, order: &OrderIntent, now: DateTime<Utc>) -> Decision {
        // Refresh the staleness clock first, for every order, denied or not.
        let now_ms = now.timestamp_millis();
        let previous_ms = self.last_evaluated_ms.fetch_max(now_ms, Ordering::AcqRel);
        let elapsed_ms = now_ms.saturating_sub(previous_ms).max(0);

        let state = self.state.read();
        let decision = decide(&state, order, now, elapsed_ms);

        match &decision {
            Decision::Deny { reason, detail, version, .. } => {
                debug!(
                    reason = %reason,
                    detail = %detail,
                    symbol = %order.symbol,
                    version = %version,
                    "Order denied"
                );
            }
            Decision::Allow { reason, version, .. } => {
                trace!(reason = %reason, symbol = %order.symbol, version = %version, "Order allowed");
            }
        }

        decision
    }

    /// Read-only view of the current policy.
    pub fn snapshot(&self) -> PolicySnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> PolicySnapshot {
        self.state.read().snapshot(now)
    }

    /// Replace the config wholesale. Returns the new version.
    ///
    /// The rate limiter is rebuilt from the new ceiling; in-flight counts are
    /// discarded.
    pub fn replace_config(&self, config: PolicyConfig) -> PolicyVersion {
        self.state.write().install_config(config)
    }

    pub fn set_global_halt(&self, halted: bool) {
        self.state.write().set_global_halt(halted);
    }

    /// Halt or resume `symbol` (case-insensitive). Blank symbols are ignored.
    pub fn set_symbol_halt(&self, symbol: &str, halted: bool) {
        self.state.write().set_symbol_halt(symbol, halted);
    }

    pub fn set_safe_mode(&self, on: bool) {
        self.state.write().set_safe_mode(on);
    }

    /// Apply a batch of administrative changes under one write lock.
    ///
    /// Evaluations see either none of the batch or all of it.
    pub fn apply(&self, update: PolicyUpdate) -> PolicySnapshot {
        let mut state = self.state.write();
        if let Some(config) = update.config {
            state.install_config(config);
        }
        if let Some(halted) = update.global_halt {
            state.set_global_halt(halted);
        }
        if let Some(on) = update.safe_mode {
            state.set_safe_mode(on);
        }
        for toggle in &update.symbol_halts {
            state.set_symbol_halt(&toggle.symbol, toggle.halted);
        }

        state.snapshot(Utc::now())
    }

    pub fn config(&self) -> Arc<PolicyConfig> {
        Arc::clone(self.state.read().config())
    }

    pub fn version(&self) -> PolicyVersion {
        self.state.read().version()
    }

    /// Instant of the most recent evaluation (or construction, before any).
    pub fn last_evaluated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_evaluated_ms.load(Ordering::Acquire))
    }
}

/// The pipeline proper. `elapsed_ms` is the time since the previous evaluation.
fn decide(
    state: &PolicyState,
    order: &OrderIntent,
    now: DateTime<Utc>,
    elapsed_ms: i64,
) -> Decision {
    let config = state.config();
    let version = state.version();
    let close_only = order.is_close_only();

    let allow = |reason| Decision::allow(reason, version, now);
    let deny = |reason, detail: String| Decision::deny(reason, detail, version, now);

    if config.empty_order_pass && order.is_empty() {
        return allow(ReasonCode::EmptyOrderPass);
    }

    // Rule 1: Kill switch
    if config.kill_switch {
        if close_only {
            return allow(ReasonCode::KillSwitchCloseOnly);
        }
        return deny(ReasonCode::KillSwitch, "kill switch active".to_string());
    }

    // Rule 2: Global halt
    if state.global_halt() && !close_only {
        return deny(ReasonCode::GlobalHalt, "global halt active".to_string());
    }

    // Rule 3: Symbol halt
    let symbol = order.normalized_symbol();
    if !close_only && state.is_symbol_halted(&symbol) {
        return deny(ReasonCode::SymbolHalt, format!("symbol {symbol} halted"));
    }

    // Rule 4: Rate limit (not bypassed by close-only)
    let limiter = state.limiter();
    if !limiter.allow_at(now.timestamp()) {
        return deny(
            ReasonCode::RateLimit,
            format!("rate limit {}/s exceeded", limiter.ceiling()),
        );
    }

    // Rule 5: Safe mode
    if state.safe_mode() && !close_only {
        return deny(ReasonCode::SafeMode, "safe mode active".to_string());
    }

    // Rule 6: Staleness
    if let Some(max_ms) = config.guards.staleness_limit_ms() {
        let max_ms = i64::try_from(max_ms).unwrap_or(i64::MAX);
        if elapsed_ms > max_ms && !close_only {
            return deny(
                ReasonCode::DataStale,
                format!("policy data stale: age {elapsed_ms}ms > {max_ms}ms"),
            );
        }
    }

    // Rule 7: Max order notional
    if let (Some(cap), Some(notional)) = (config.limits.order_cap(), order.positive_notional()) {
        if notional > cap && !close_only {
            return deny(
                ReasonCode::MaxOrder,
                format!("order notional {notional} > {cap}"),
            );
        }
    }

    // Rule 8: Close-only terminal allow
    if close_only {
        return allow(ReasonCode::CloseOnly);
    }

    // Rule 9: Pass
    allow(ReasonCode::Pass)
}
