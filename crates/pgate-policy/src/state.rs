//! Mutable runtime policy owned by the gate.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pgate_core::{normalize_symbol, GuardsConfig, LimitsConfig, PolicyConfig, PolicyVersion};

use crate::rate_limiter::RateLimiter;

/// How long a consumer should treat a snapshot as current, in milliseconds.
pub const SNAPSHOT_TTL_MS: i64 = 3000;

/// Halts, safe mode and the active config.
///
/// Only the gate holds one of these; it is read under a shared lock for the
/// whole of an evaluation and written under an exclusive lock by
/// administrative calls.
#[derive(Debug)]
pub struct PolicyState {
    global_halt: bool,
    safe_mode: bool,
    /// Uppercase symbols.
    halted_symbols: BTreeSet<String>,
    config: Arc<PolicyConfig>,
    version: PolicyVersion,
    /// Rebuilt on every config install; counts are never migrated.
    limiter: RateLimiter,
}

impl PolicyState {
    /// Initial state: no halts, safe mode off, `config` at [`PolicyVersion::INITIAL`].
    pub fn new(config: PolicyConfig) -> Self {
        let limiter = RateLimiter::new(config.limits.effective_rate_per_sec());
        Self {
            global_halt: false,
            safe_mode: false,
            halted_symbols: BTreeSet::new(),
            config: Arc::new(config),
            version: PolicyVersion::INITIAL,
            limiter,
        }
    }

    pub fn global_halt(&self) -> bool {
        self.global_halt
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn config(&self) -> &Arc<PolicyConfig> {
        &self.config
    }

    pub fn version(&self) -> PolicyVersion {
        self.version
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn halted_symbols(&self) -> impl Iterator<Item = &str> {
        self.halted_symbols.iter().map(String::as_str)
    }

    /// Membership test for an already-normalized symbol.
    pub fn is_symbol_halted(&self, normalized: &str) -> bool {
        self.halted_symbols.contains(normalized)
    }

    pub fn set_global_halt(&mut self, halted: bool) {
        if self.global_halt != halted {
            if halted {
                warn!("GLOBAL HALT SET - opening orders blocked");
            } else {
                info!("Global halt cleared");
            }
        }
        self.global_halt = halted;
    }

    pub fn set_safe_mode(&mut self, on: bool) {
        if self.safe_mode != on {
            info!(on, "Safe mode changed");
        }
        self.safe_mode = on;
    }

    /// Halt or resume one symbol. Blank symbols are ignored.
    pub fn set_symbol_halt(&mut self, symbol: &str, halted: bool) {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return;
        }

        let changed = if halted {
            self.halted_symbols.insert(symbol.clone())
        } else {
            self.halted_symbols.remove(&symbol)
        };
        if changed {
            info!(symbol = %symbol, halted, "Symbol halt changed");
        }
    }

    /// Install a new config, bump the version and rebuild the rate limiter.
    ///
    /// The caller is responsible for validating `config` first.
    pub fn install_config(&mut self, config: PolicyConfig) -> PolicyVersion {
        self.limiter = RateLimiter::new(config.limits.effective_rate_per_sec());
        self.config = Arc::new(config);
        self.version = self.version.next();
        info!(
            version = %self.version,
            rate_per_sec = self.limiter.ceiling(),
            kill_switch = self.config.kill_switch,
            "Policy config replaced"
        );
        self.version
    }

    /// Read-only view as of `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> PolicySnapshot {
        PolicySnapshot {
            version: self.version,
            safe_mode: self.safe_mode,
            global_halt: self.global_halt,
            halted_symbols: self.halted_symbols.iter().cloned().collect(),
            kill_switch: self.config.kill_switch,
            limits: self.config.limits.clone(),
            guards: self.config.guards.clone(),
            ttl_ms: SNAPSHOT_TTL_MS,
            asof: now,
        }
    }
}

/// Immutable copy of the policy handed to administrators and consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub version: PolicyVersion,
    #[serde(rename = "safeMode")]
    pub safe_mode: bool,
    #[serde(rename = "globalHalt")]
    pub global_halt: bool,
    /// Sorted.
    #[serde(rename = "haltedSymbols")]
    pub halted_symbols: Vec<String>,
    #[serde(rename = "killSwitch")]
    pub kill_switch: bool,
    pub limits: LimitsConfig,
    pub guards: GuardsConfig,
    pub ttl_ms: i64,
    pub asof: DateTime<Utc>,
}

/// One symbol halt toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolHalt {
    pub symbol: String,
    pub halted: bool,
}

/// Batch of administrative changes applied atomically by the gate.
///
/// Absent fields leave the corresponding state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpdate {
    /// Replacement config. Installing one bumps the version.
    #[serde(default)]
    pub config: Option<PolicyConfig>,
    #[serde(default)]
    pub global_halt: Option<bool>,
    #[serde(default)]
    pub safe_mode: Option<bool>,
    #[serde(default)]
    pub symbol_halts: Vec<SymbolHalt>,
}

impl PolicyUpdate {
    pub fn is_empty(&self) -> bool {
        self.config.is_none()
            && self.global_halt.is_none()
            && self.safe_mode.is_none()
            && self.symbol_halts.is_empty()
    }
}
