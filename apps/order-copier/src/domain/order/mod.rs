//! Order Types
//!
//! The inbound [`OrderEvent`] observed on the source account and the
//! outbound [`OrderRequest`] placed on the destination account.
//!
//! Events keep the source's raw side, type and time-in-force tokens;
//! the translator is responsible for turning them into the typed values
//! used by [`OrderRequest`].

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of a source order.
///
/// Only `New` and `PartiallyFilled` matter for replication. Everything the
/// exchange reports that is not one of the named variants is kept verbatim
/// in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order accepted and resting.
    New,
    /// Order partially executed.
    PartiallyFilled,
    /// Order completely executed.
    Filled,
    /// Order canceled.
    Canceled,
    /// Order rejected by the exchange.
    Rejected,
    /// Order expired.
    Expired,
    /// Any other exchange status (pending_new, done_for_day, ...).
    Other(String),
}

impl OrderStatus {
    /// Parse an exchange status token, case-insensitively.
    ///
    /// Unknown tokens never fail; they become [`OrderStatus::Other`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "new" => Self::New,
            "partially_filled" => Self::PartiallyFilled,
            "filled" => Self::Filled,
            "canceled" | "cancelled" => Self::Canceled,
            "rejected" => Self::Rejected,
            "expired" => Self::Expired,
            _ => Self::Other(token.trim().to_string()),
        }
    }

    /// Status name used in logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::PartiallyFilled => "partially_filled",
            Self::Filled => "filled",
            Self::Canceled => "canceled",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Event (inbound)
// =============================================================================

/// An order lifecycle notification from the source account.
///
/// Read-only to the replication pipeline: the translator builds a new
/// [`OrderRequest`] from it and never modifies the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Source order ID.
    pub order_id: String,
    /// Instrument identifier as sent by the source.
    pub symbol: String,
    /// Raw side token (e.g. "buy").
    pub side: String,
    /// Order quantity. `None` for notional-sized source orders.
    pub quantity: Option<Decimal>,
    /// Limit price. `None` or zero for market orders.
    pub price: Option<Decimal>,
    /// Stop trigger price for stop and stop-limit orders.
    pub stop_price: Option<Decimal>,
    /// Raw order type token (e.g. "limit").
    pub order_type: String,
    /// Raw time-in-force token.
    pub time_in_force: Option<String>,
    /// Lifecycle status.
    pub status: OrderStatus,
}

// =============================================================================
// Order Request Value Types
// =============================================================================

/// Normalized instrument symbol in the destination's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Wrap an already-normalized symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl OrderSide {
    /// Side name as sent to the destination.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type supported for replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Market order
    Market,
    /// Limit order
    Limit,
    /// Stop order
    Stop,
    /// Stop-limit order
    StopLimit,
}

impl OrderType {
    /// Type name as sent to the destination.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::Stop => "stop",
            Self::StopLimit => "stop_limit",
        }
    }

    /// Whether this type carries a limit price.
    #[must_use]
    pub const fn requires_limit_price(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }

    /// Whether this type carries a stop price.
    #[must_use]
    pub const fn requires_stop_price(&self) -> bool {
        matches!(self, Self::Stop | Self::StopLimit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Day order (canceled at end of day)
    #[default]
    Day,
    /// Good-til-canceled
    Gtc,
    /// Market open (execute at open)
    Opg,
    /// Market close (execute at close)
    Cls,
    /// Immediate-or-cancel
    Ioc,
    /// Fill-or-kill
    Fok,
}

impl TimeInForce {
    /// Time-in-force name as sent to the destination.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Gtc => "gtc",
            Self::Opg => "opg",
            Self::Cls => "cls",
            Self::Ioc => "ioc",
            Self::Fok => "fok",
        }
    }
}

/// Whether an order opens a new position or closes an existing one.
///
/// The copier only ever opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionIntent {
    /// Open a new position.
    #[default]
    Open,
}

// =============================================================================
// Order Request (outbound)
// =============================================================================

/// Instruction to place a new order on the destination account.
///
/// Built once per eligible event and moved into the single submission
/// call that consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Normalized symbol.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Quantity, copied without rounding.
    pub quantity: Decimal,
    /// Limit price, copied without rounding. Only limit and stop-limit
    /// orders carry one; the event's price is dropped for other types.
    pub price: Option<Decimal>,
    /// Stop price, copied without rounding. Only stop and stop-limit
    /// orders carry one.
    pub stop_price: Option<Decimal>,
    /// Order type.
    pub order_type: OrderType,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Always [`PositionIntent::Open`].
    pub position_intent: PositionIntent,
}
