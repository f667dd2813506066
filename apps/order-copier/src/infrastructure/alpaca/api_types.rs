//! Alpaca Trading REST API Types
//!
//! Request and response bodies for `POST /v2/orders`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::OrderAck;
use crate::domain::order::{OrderRequest, OrderSide, PositionIntent};

// ============================================================================
// Order Request Types
// ============================================================================

/// Order placement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlpacaOrderRequest {
    /// Symbol.
    pub symbol: String,
    /// Quantity, decimal string.
    pub qty: String,
    /// Order side.
    pub side: &'static str,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: &'static str,
    /// Time in force.
    pub time_in_force: &'static str,
    /// Limit price (limit and stop-limit orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
    /// Stop price (stop and stop-limit orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    /// Opening or closing intent.
    pub position_intent: &'static str,
}

impl From<&OrderRequest> for AlpacaOrderRequest {
    fn from(request: &OrderRequest) -> Self {
        Self {
            symbol: request.symbol.as_str().to_string(),
            qty: request.quantity.to_string(),
            side: request.side.as_str(),
            order_type: request.order_type.as_str(),
            time_in_force: request.time_in_force.as_str(),
            limit_price: request.price.map(|p| p.to_string()),
            stop_price: request.stop_price.map(|p| p.to_string()),
            position_intent: position_intent(request.side, request.position_intent),
        }
    }
}

const fn position_intent(side: OrderSide, intent: PositionIntent) -> &'static str {
    match (side, intent) {
        (OrderSide::Buy, PositionIntent::Open) => "buy_to_open",
        (OrderSide::Sell, PositionIntent::Open) => "sell_to_open",
    }
}

// ============================================================================
// Order Response Types
// ============================================================================

/// Order placement response. Only the fields the copier reports are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaOrderResponse {
    /// Broker order ID.
    pub id: String,
    /// Client order ID.
    #[serde(default)]
    pub client_order_id: String,
    /// Symbol.
    pub symbol: String,
    /// Quantity (as string).
    #[serde(default)]
    pub qty: Option<String>,
    /// Order status.
    pub status: String,
    /// Order side.
    pub side: String,
}

impl AlpacaOrderResponse {
    /// Convert to `OrderAck`.
    #[must_use]
    pub fn to_order_ack(&self) -> OrderAck {
        OrderAck {
            broker_order_id: self.id.clone(),
            client_order_id: self.client_order_id.clone(),
            status: self.status.clone(),
            symbol: self.symbol.clone(),
            side: self.side.clone(),
            quantity: self.qty.as_deref().and_then(|q| q.parse::<Decimal>().ok()),
        }
    }
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaErrorResponse {
    /// Numeric error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Error message.
    pub message: String,
}
