//! Alpaca Trade Updates Message Types
//!
//! Wire format types for the trading account's `trade_updates` websocket
//! stream. Inbound frames are JSON objects keyed by `stream`; errors use the
//! market-data style `T: "error"` shape.
//!
//! # Message Types
//!
//! - `Authorization`: result of the `authenticate` action
//! - `Listening`: confirmation of the `listen` action
//! - `TradeUpdate`: order lifecycle event
//! - `Error`: error response with code and message
//!
//! # References
//!
//! - [Trade Updates](https://docs.alpaca.markets/docs/websocket-streaming)

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderEvent, OrderStatus};

// =============================================================================
// Control Messages
// =============================================================================

/// Error message with code and description.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "error", "code": 402, "msg": "auth failed"}
/// ```
///
/// # Error Codes
/// - 400: Invalid syntax
/// - 401: Not authenticated
/// - 402: Auth failed
/// - 403: Already authenticated
/// - 404: Auth timeout
/// - 406: Connection limit exceeded
/// - 500: Internal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Message type (always "error")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Error code
    pub code: i32,

    /// Error message
    pub msg: String,
}

impl ErrorMessage {
    /// Check if this is an authentication error.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self.code, 401..=404)
    }
}

/// Authorization response.
///
/// # Wire Format (JSON)
/// ```json
/// {"stream": "authorization", "data": {"status": "authorized", "action": "authenticate"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationMessage {
    /// Stream name (always "authorization")
    pub stream: String,

    /// Authorization data
    pub data: AuthorizationData,
}

/// Authorization response data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationData {
    /// Status: "authorized" or "unauthorized"
    pub status: String,

    /// Action: "authenticate"
    pub action: String,
}

impl AuthorizationMessage {
    /// Check if authorization succeeded.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.data.status == "authorized"
    }
}

/// Listening confirmation message.
///
/// # Wire Format (JSON)
/// ```json
/// {"stream": "listening", "data": {"streams": ["trade_updates"]}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningMessage {
    /// Stream name (always "listening")
    pub stream: String,

    /// Listening data
    pub data: ListeningData,
}

/// Listening confirmation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningData {
    /// List of active streams
    #[serde(default)]
    pub streams: Vec<String>,
}

impl ListeningMessage {
    /// Whether `trade_updates` is among the active streams.
    #[must_use]
    pub fn includes_trade_updates(&self) -> bool {
        self.data.streams.iter().any(|s| s == TRADE_UPDATES_STREAM)
    }
}

// =============================================================================
// Trade Update Messages
// =============================================================================

/// Stream name for order events.
pub const TRADE_UPDATES_STREAM: &str = "trade_updates";

/// Order details within a trade update message.
///
/// Side, type and time in force are kept as raw tokens; the translator
/// decides what is replicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// Unique order ID
    pub id: String,

    /// Client-provided order ID
    #[serde(default)]
    pub client_order_id: Option<String>,

    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Ticker symbol
    pub symbol: String,

    /// Asset class (`us_equity`, `us_option`, crypto)
    #[serde(default)]
    pub asset_class: Option<String>,

    /// Order quantity (null for notional orders)
    #[serde(default)]
    pub qty: Option<String>,

    /// Notional value for fractional orders
    #[serde(default)]
    pub notional: Option<String>,

    /// Filled quantity
    #[serde(default)]
    pub filled_qty: Option<String>,

    /// Order type
    #[serde(rename = "type", alias = "order_type")]
    pub order_type: String,

    /// Order side
    pub side: String,

    /// Time in force
    #[serde(default)]
    pub time_in_force: Option<String>,

    /// Limit price
    #[serde(default)]
    pub limit_price: Option<String>,

    /// Stop price
    #[serde(default)]
    pub stop_price: Option<String>,

    /// Current order status
    pub status: String,
}

/// Trade update message data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeUpdateData {
    /// Event type (new, fill, partial_fill, canceled, ...)
    pub event: String,

    /// Order details
    pub order: OrderDetails,

    /// Event timestamp
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Fill price (for fill events)
    #[serde(default)]
    pub price: Option<String>,

    /// Fill quantity (for fill events)
    #[serde(default)]
    pub qty: Option<String>,
}

/// Trade update message.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "stream": "trade_updates",
///   "data": {
///     "event": "new",
///     "order": { "id": "...", "symbol": "AAPL", "side": "buy", "type": "limit", ... }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeUpdateMessage {
    /// Stream name (always `trade_updates`)
    pub stream: String,

    /// Update data
    pub data: TradeUpdateData,
}

/// A trade update field held a value that is not a decimal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field {field} is not a decimal: {value:?}")]
pub struct InvalidDecimal {
    /// Field name
    pub field: &'static str,
    /// Raw value
    pub value: String,
}

fn parse_decimal(field: &'static str, raw: Option<&str>) -> Result<Option<Decimal>, InvalidDecimal> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Decimal::from_str(value)
            .map(Some)
            .map_err(|_| InvalidDecimal {
                field,
                value: value.to_string(),
            }),
    }
}

impl TryFrom<&TradeUpdateMessage> for OrderEvent {
    type Error = InvalidDecimal;

    fn try_from(msg: &TradeUpdateMessage) -> Result<Self, Self::Error> {
        let order = &msg.data.order;
        Ok(Self {
            order_id: order.id.clone(),
            symbol: order.symbol.clone(),
            side: order.side.clone(),
            quantity: parse_decimal("qty", order.qty.as_deref())?,
            price: parse_decimal("limit_price", order.limit_price.as_deref())?,
            stop_price: parse_decimal("stop_price", order.stop_price.as_deref())?,
            order_type: order.order_type.clone(),
            time_in_force: order.time_in_force.clone(),
            status: status_from_event(&msg.data.event),
        })
    }
}

/// Lifecycle status carried by a trade update.
///
/// Taken from the update's `event`, not from `order.status`: updates such
/// as `order_cancel_rejected` or `restated` arrive while the order still
/// reads `new` and must not look like fresh activity.
fn status_from_event(event: &str) -> OrderStatus {
    match event.trim().to_ascii_lowercase().as_str() {
        "new" => OrderStatus::New,
        "partial_fill" => OrderStatus::PartiallyFilled,
        "fill" => OrderStatus::Filled,
        "canceled" => OrderStatus::Canceled,
        "rejected" => OrderStatus::Rejected,
        "expired" => OrderStatus::Expired,
        _ => OrderStatus::Other(event.trim().to_string()),
    }
}

// =============================================================================
// Outbound Messages (Client -> Server)
// =============================================================================

/// Authentication request for the trade updates stream.
#[derive(Debug, Clone, Serialize)]
pub struct TradeAuthRequest {
    /// Action: "authenticate"
    pub action: &'static str,

    /// Authentication data
    pub data: TradeAuthData,
}

/// Authentication data for the trade updates stream.
#[derive(Clone, Serialize)]
pub struct TradeAuthData {
    /// API key
    pub key_id: String,

    /// API secret
    pub secret_key: String,
}

impl std::fmt::Debug for TradeAuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeAuthData")
            .field("key_id", &self.key_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl TradeAuthRequest {
    /// Create a new trade authentication request.
    #[must_use]
    pub const fn new(key: String, secret: String) -> Self {
        Self {
            action: "authenticate",
            data: TradeAuthData {
                key_id: key,
                secret_key: secret,
            },
        }
    }
}

/// Listen request for the trade updates stream.
#[derive(Debug, Clone, Serialize)]
pub struct ListenRequest {
    /// Action: "listen"
    pub action: &'static str,

    /// Listen data
    pub data: ListenData,
}

/// Listen data for the trade updates stream.
#[derive(Debug, Clone, Serialize)]
pub struct ListenData {
    /// Streams to listen to
    pub streams: Vec<String>,
}

impl ListenRequest {
    /// Create a listen request for trade updates.
    #[must_use]
    pub fn trade_updates() -> Self {
        Self {
            action: "listen",
            data: ListenData {
                streams: vec![TRADE_UPDATES_STREAM.to_string()],
            },
        }
    }
}

// =============================================================================
// Unified Incoming Message Enum
// =============================================================================

/// Any inbound message on the trade updates stream.
///
/// `TradeUpdate` is boxed since it is much larger than the other variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlpacaMessage {
    /// Error message
    Error(ErrorMessage),

    /// Order lifecycle event
    TradeUpdate(Box<TradeUpdateMessage>),

    /// Authorization response
    Authorization(AuthorizationMessage),

    /// Listening confirmation
    Listening(ListeningMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const NEW_LIMIT: &str = r#"{
        "stream": "trade_updates",
        "data": {
            "event": "new",
            "timestamp": "2024-03-01T14:30:00.123Z",
            "order": {
                "id": "61e69015-8549-4bfd-b9c3-01e75843f47d",
                "client_order_id": "eb9e2aaa-f71a-4f51-b5b4-52a6c565dad4",
                "symbol": "AAPL",
                "asset_class": "us_equity",
                "qty": "10",
                "filled_qty": "0",
                "type": "limit",
                "side": "buy",
                "time_in_force": "gtc",
                "limit_price": "150.25",
                "stop_price": null,
                "status": "new"
            }
        }
    }"#;

    #[test]
    fn deserialize_trade_update() {
        let msg: TradeUpdateMessage = serde_json::from_str(NEW_LIMIT).unwrap();
        assert_eq!(msg.stream, TRADE_UPDATES_STREAM);
        assert_eq!(msg.data.event, "new");
        assert_eq!(msg.data.order.order_type, "limit");
        assert_eq!(msg.data.order.limit_price.as_deref(), Some("150.25"));
        assert!(msg.data.order.stop_price.is_none());
    }

    #[test]
    fn trade_update_converts_to_order_event() {
        let msg: TradeUpdateMessage = serde_json::from_str(NEW_LIMIT).unwrap();
        let event = OrderEvent::try_from(&msg).unwrap();

        assert_eq!(event.order_id, "61e69015-8549-4bfd-b9c3-01e75843f47d");
        assert_eq!(event.symbol, "AAPL");
        assert_eq!(event.side, "buy");
        assert_eq!(event.quantity, Some(Decimal::TEN));
        assert_eq!(event.price, Some(Decimal::new(15025, 2)));
        assert_eq!(event.stop_price, None);
        assert_eq!(event.time_in_force.as_deref(), Some("gtc"));
        assert_eq!(event.status, OrderStatus::New);
    }

    fn update_with_event(event: &str, order_status: &str) -> TradeUpdateMessage {
        let json = format!(
            r#"{{"stream":"trade_updates","data":{{"event":"{event}","order":{{
            "id":"o-1","symbol":"AAPL","qty":"1","type":"market","side":"buy","status":"{order_status}"}}}}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test_case("new", "new", OrderStatus::New ; "new")]
    #[test_case("partial_fill", "partially_filled", OrderStatus::PartiallyFilled ; "partial fill")]
    #[test_case("fill", "filled", OrderStatus::Filled ; "fill")]
    #[test_case("canceled", "canceled", OrderStatus::Canceled ; "canceled")]
    #[test_case("rejected", "rejected", OrderStatus::Rejected ; "rejected")]
    #[test_case("expired", "expired", OrderStatus::Expired ; "expired")]
    #[test_case("order_cancel_rejected", "new", OrderStatus::Other("order_cancel_rejected".into()) ; "cancel rejected on open order")]
    #[test_case("order_replace_rejected", "partially_filled", OrderStatus::Other("order_replace_rejected".into()) ; "replace rejected on partial")]
    #[test_case("restated", "new", OrderStatus::Other("restated".into()) ; "restated")]
    #[test_case("pending_new", "new", OrderStatus::Other("pending_new".into()) ; "pending new")]
    #[test_case("pending_cancel", "new", OrderStatus::Other("pending_cancel".into()) ; "pending cancel")]
    fn status_follows_update_event(event: &str, order_status: &str, expected: OrderStatus) {
        let msg = update_with_event(event, order_status);
        let converted = OrderEvent::try_from(&msg).unwrap();

        assert_eq!(converted.status, expected);
    }

    #[test]
    fn non_lifecycle_update_on_open_order_is_not_eligible() {
        let msg = update_with_event("order_cancel_rejected", "new");
        let converted = OrderEvent::try_from(&msg).unwrap();

        assert!(!crate::domain::replication::is_eligible(&converted));
    }

    #[test]
    fn notional_order_has_no_quantity() {
        let json = r#"{"stream":"trade_updates","data":{"event":"new","order":{
            "id":"o-1","symbol":"AAPL","qty":null,"notional":"500",
            "type":"market","side":"buy","status":"new"}}}"#;
        let msg: TradeUpdateMessage = serde_json::from_str(json).unwrap();
        let event = OrderEvent::try_from(&msg).unwrap();
        assert!(event.quantity.is_none());
    }

    #[test]
    fn malformed_decimal_is_rejected() {
        let json = r#"{"stream":"trade_updates","data":{"event":"new","order":{
            "id":"o-1","symbol":"AAPL","qty":"ten",
            "type":"market","side":"buy","status":"new"}}}"#;
        let msg: TradeUpdateMessage = serde_json::from_str(json).unwrap();
        let err = OrderEvent::try_from(&msg).unwrap_err();
        assert_eq!(err.field, "qty");
    }

    #[test]
    fn authorization_status() {
        let json = r#"{"stream":"authorization","data":{"status":"unauthorized","action":"authenticate"}}"#;
        let msg: AuthorizationMessage = serde_json::from_str(json).unwrap();
        assert!(!msg.is_authorized());
    }

    #[test]
    fn listening_includes_trade_updates() {
        let json = r#"{"stream":"listening","data":{"streams":["trade_updates"]}}"#;
        let msg: ListeningMessage = serde_json::from_str(json).unwrap();
        assert!(msg.includes_trade_updates());
    }

    #[test]
    fn serialize_requests() {
        let auth = serde_json::to_value(TradeAuthRequest::new("k".into(), "s".into())).unwrap();
        assert_eq!(
            auth,
            serde_json::json!({"action":"authenticate","data":{"key_id":"k","secret_key":"s"}})
        );

        let listen = serde_json::to_value(ListenRequest::trade_updates()).unwrap();
        assert_eq!(
            listen,
            serde_json::json!({"action":"listen","data":{"streams":["trade_updates"]}})
        );
    }

    #[test]
    fn auth_data_debug_redacts_secret() {
        let request = TradeAuthRequest::new("key".into(), "very-secret".into());
        let debug = format!("{request:?}");
        assert!(!debug.contains("very-secret"));
    }
}
