//! Request and response bodies for the HTTP routes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pgate_core::{decimal_from_value, Decision, OrderIntent};

/// Market an order route serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Spot,
    Mix,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Mix => write!(f, "mix"),
        }
    }
}

/// Market order as posted by a strategy.
///
/// The policy-relevant fields are decoded leniently through [`OrderIntent`];
/// `size` only matters when `sizeType` is `USDT`, in which case it stands in
/// for a missing notional. Other exchange fields are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(flatten)]
    pub order: OrderIntent,
    #[serde(default)]
    pub size_type: Option<String>,
    #[serde(default)]
    pub size: Option<Value>,
}

impl OrderRequest {
    /// True when `size` is denominated in quote currency.
    pub fn is_quote_sized(&self) -> bool {
        self.size_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("usdt"))
    }

    /// Order intent handed to the gate.
    pub fn into_intent(self) -> OrderIntent {
        let size = if self.is_quote_sized() {
            self.size.as_ref().and_then(decimal_from_value)
        } else {
            None
        };
        let mut order = self.order;
        if order.positive_notional().is_none() {
            if let Some(size) = size {
                order = order.with_notional(size);
            }
        }
        order
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 200: the gate allowed the order and dry-run answered it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAccepted {
    pub ok: bool,
    pub dry_run: bool,
    pub market: Market,
    pub decision: Decision,
}

/// 403: the gate denied the order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRejected {
    pub ok: bool,
    pub decision: Decision,
}

/// 501: the gate allowed the order but nothing can place it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderNotPlaced {
    pub ok: bool,
    pub error: String,
    pub decision: Decision,
}
