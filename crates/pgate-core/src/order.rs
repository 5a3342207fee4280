//! Order intent as seen by policy checks.
//!
//! The gate only needs a handful of fields from an order: the symbol (for
//! symbol halts), the notional (for the order cap) and whether the order is
//! close-only (which unlocks the privileged path through halts and guards).
//! Decoding is lenient: callers send loosely typed JSON and a
//! malformed number must degrade to "unspecified", never to an error.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Parse a side case-insensitively. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Canonical symbol form used for halts: trimmed and uppercased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// A proposed order, constructed by the caller for a single evaluation.
///
/// Wire shape: `{symbol, side, notional|quote, reduceOnly|closeOnly|intent}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOrderIntent", rename_all = "camelCase")]
pub struct OrderIntent {
    /// Symbol as supplied (case is normalized at check time).
    pub symbol: String,
    /// Side, if recognised.
    pub side: Option<OrderSide>,
    /// Order value in quote currency. Zero means unspecified.
    pub notional: Decimal,
    /// Explicit reduce-only flag.
    pub reduce_only: bool,
    /// Explicit close-only flag.
    pub close_only: bool,
    /// Free-form intent tag; `"close"` marks the order close-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl OrderIntent {
    /// Create an order for `symbol` on `side` with no notional and no close signal.
    pub fn new(symbol: impl Into<String>, side: OrderSide) -> Self {
        Self {
            symbol: symbol.into(),
            side: Some(side),
            ..Self::default()
        }
    }

    /// Set the notional. Negative values are stored as zero.
    #[must_use]
    pub fn with_notional(mut self, notional: Decimal) -> Self {
        self.notional = notional.max(Decimal::ZERO);
        self
    }

    #[must_use]
    pub fn with_reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    #[must_use]
    pub fn with_close_only(mut self) -> Self {
        self.close_only = true;
        self
    }

    #[must_use]
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    /// Symbol in canonical form.
    pub fn normalized_symbol(&self) -> String {
        normalize_symbol(&self.symbol)
    }

    /// True when any of the three close signals is present.
    pub fn is_close_only(&self) -> bool {
        self.reduce_only
            || self.close_only
            || self
                .intent
                .as_deref()
                .is_some_and(|tag| tag.trim().eq_ignore_ascii_case("close"))
    }

    /// Notional if one was specified.
    pub fn positive_notional(&self) -> Option<Decimal> {
        (self.notional > Decimal::ZERO).then_some(self.notional)
    }

    /// The degenerate `{}` record: nothing a policy check could act on.
    pub fn is_empty(&self) -> bool {
        self.symbol.trim().is_empty()
            && self.side.is_none()
            && self.positive_notional().is_none()
            && !self.is_close_only()
    }
}

/// Loosely typed wire form. Every field is optional and accepts any JSON value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOrderIntent {
    symbol: Option<Value>,
    side: Option<Value>,
    notional: Option<Value>,
    quote: Option<Value>,
    reduce_only: Option<Value>,
    close_only: Option<Value>,
    intent: Option<Value>,
}

impl From<RawOrderIntent> for OrderIntent {
    fn from(raw: RawOrderIntent) -> Self {
        let symbol = match raw.symbol {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let side = match raw.side {
            Some(Value::String(s)) => OrderSide::parse(&s),
            _ => None,
        };
        // `notional` takes precedence; `quote` fills in when it is absent or zero.
        let notional = [raw.notional, raw.quote]
            .iter()
            .flatten()
            .filter_map(decimal_from_value)
            .find(|n| *n > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);
        let intent = match raw.intent {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        Self {
            symbol,
            side,
            notional,
            reduce_only: raw.reduce_only.as_ref().is_some_and(coerce_flag),
            close_only: raw.close_only.as_ref().is_some_and(coerce_flag),
            intent,
        }
    }
}

/// Coerce a JSON number or numeric string to a decimal.
///
/// Values beyond the decimal range saturate to `Decimal::MAX` (or `MIN`);
/// magnitudes below its precision read as zero. Returns `None` for anything
/// that is not a number, including `inf`/`nan` strings.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(saturating_decimal)),
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
                .or_else(|| {
                    if !s.bytes().any(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    s.parse::<f64>().ok().and_then(saturating_decimal)
                })
        }
        _ => None,
    }
}

fn saturating_decimal(f: f64) -> Option<Decimal> {
    if f.is_nan() {
        return None;
    }
    if let Ok(d) = Decimal::try_from(f) {
        return Some(d);
    }
    match f {
        f if f >= 1.0 => Some(Decimal::MAX),
        f if f <= -1.0 => Some(Decimal::MIN),
        _ => Some(Decimal::ZERO),
    }
}

fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        ),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}
