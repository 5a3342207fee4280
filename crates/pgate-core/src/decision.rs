//! Decision records returned by the policy gate.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an allow decision stays executable, in milliseconds.
pub const DECISION_TTL_MS: i64 = 3000;

/// Reason attached to every decision.
///
/// The string forms are stable; consumers match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Kill switch on, order is close-only: allowed.
    KillSwitchCloseOnly,
    /// Kill switch on.
    KillSwitch,
    /// Global trading halt.
    GlobalHalt,
    /// Symbol is halted.
    SymbolHalt,
    /// Per-second request ceiling reached.
    RateLimit,
    /// Safe mode on.
    SafeMode,
    /// Previous evaluation too long ago.
    DataStale,
    /// Notional above the configured cap.
    MaxOrder,
    /// Close-only order that passed every check.
    CloseOnly,
    /// Passed every check.
    Pass,
    /// Empty order record admitted before any rule ran.
    EmptyOrderPass,
}

impl ReasonCode {
    /// Every reason code, in pipeline order.
    pub const ALL: [ReasonCode; 11] = [
        Self::EmptyOrderPass,
        Self::KillSwitchCloseOnly,
        Self::KillSwitch,
        Self::GlobalHalt,
        Self::SymbolHalt,
        Self::RateLimit,
        Self::SafeMode,
        Self::DataStale,
        Self::MaxOrder,
        Self::CloseOnly,
        Self::Pass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KillSwitchCloseOnly => "KILL_SWITCH_CLOSE_ONLY",
            Self::KillSwitch => "KILL_SWITCH",
            Self::GlobalHalt => "GLOBAL_HALT",
            Self::SymbolHalt => "SYMBOL_HALT",
            Self::RateLimit => "RATE_LIMIT",
            Self::SafeMode => "SAFE_MODE",
            Self::DataStale => "DATA_STALE",
            Self::MaxOrder => "MAX_ORDER",
            Self::CloseOnly => "CLOSE_ONLY",
            Self::Pass => "PASS",
            Self::EmptyOrderPass => "EMPTY_ORDER_PASS",
        }
    }

    /// Whether this reason accompanies an allow decision.
    pub fn is_allow(&self) -> bool {
        matches!(
            self,
            Self::KillSwitchCloseOnly | Self::CloseOnly | Self::Pass | Self::EmptyOrderPass
        )
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy config epoch. Bumped every time the config is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyVersion(u64);

impl PolicyVersion {
    /// Version of a freshly constructed gate.
    pub const INITIAL: PolicyVersion = PolicyVersion(1);

    pub fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for PolicyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Outcome of a single evaluation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    Allow {
        reason: ReasonCode,
        version: PolicyVersion,
        /// The caller must not execute against this decision after this instant.
        expires_at: DateTime<Utc>,
    },
    Deny {
        reason: ReasonCode,
        detail: String,
        version: PolicyVersion,
        denied_at: DateTime<Utc>,
    },
}

impl Decision {
    /// Build an allow decision valid for [`DECISION_TTL_MS`] from `now`.
    pub fn allow(reason: ReasonCode, version: PolicyVersion, now: DateTime<Utc>) -> Self {
        debug_assert!(reason.is_allow(), "{reason} is not an allow reason");
        Self::Allow {
            reason,
            version,
            expires_at: now + Duration::milliseconds(DECISION_TTL_MS),
        }
    }

    pub fn deny(
        reason: ReasonCode,
        detail: impl Into<String>,
        version: PolicyVersion,
        now: DateTime<Utc>,
    ) -> Self {
        debug_assert!(!reason.is_allow(), "{reason} is not a deny reason");
        Self::Deny {
            reason,
            detail: detail.into(),
            version,
            denied_at: now,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny { .. })
    }

    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::Allow { reason, .. } | Self::Deny { reason, .. } => *reason,
        }
    }

    pub fn version(&self) -> PolicyVersion {
        match self {
            Self::Allow { version, .. } | Self::Deny { version, .. } => *version,
        }
    }

    /// Human-readable detail. Allow decisions carry none.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Allow { .. } => None,
            Self::Deny { detail, .. } => Some(detail),
        }
    }

    /// Expiry instant of an allow decision.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Allow { expires_at, .. } => Some(*expires_at),
            Self::Deny { .. } => None,
        }
    }

    /// True if this decision may still be executed at `now`.
    ///
    /// Denials are never executable.
    pub fn is_executable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| now < exp)
    }
}
