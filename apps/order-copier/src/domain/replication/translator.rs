//! Order Translator
//!
//! Maps a source [`OrderEvent`] to a destination [`OrderRequest`].
//!
//! # Mapping
//!
//! | Event field | Request field | Rule |
//! |---|---|---|
//! | `symbol` | `symbol` | [`SymbolNormalizer`] of the destination exchange |
//! | `side` | `side` | `buy` / `sell`, case-insensitive |
//! | `order_type` | `order_type` | `market`, `limit`, `stop`, `stop_limit` |
//! | `time_in_force` | `time_in_force` | absent means `day` |
//! | `quantity`, `price`, `stop_price` | same | copied, no rounding; prices the type does not use are dropped |
//! | - | `position_intent` | always `open` |
//!
//! Quantities and prices are never rescaled: the destination account is
//! assumed to share the instrument's precision rules.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::order::{
    OrderEvent, OrderRequest, OrderSide, OrderType, PositionIntent, Symbol, TimeInForce,
};

// =============================================================================
// Symbol Normalization
// =============================================================================

/// Symbol normalization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// Symbol was empty after trimming.
    #[error("symbol is empty")]
    Empty,

    /// Symbol contains a character the exchange does not accept.
    #[error("symbol {symbol:?} contains invalid character {character:?}")]
    InvalidCharacter {
        /// The offending symbol
        symbol: String,
        /// First invalid character
        character: char,
    },
}

/// Maps a source symbol to the destination exchange's symbol format.
///
/// Provided by the exchange adapter.
pub trait SymbolNormalizer: Send + Sync {
    /// Normalize a raw symbol.
    ///
    /// # Errors
    ///
    /// Returns `SymbolError` when the symbol cannot be expressed in the
    /// destination's format.
    fn normalize(&self, raw: &str) -> Result<Symbol, SymbolError>;
}

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while translating a source event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// Symbol could not be normalized.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(#[from] SymbolError),

    /// Side token is not buy or sell.
    #[error("unknown side token: {0:?}")]
    UnknownSide(String),

    /// Order type token is not recognized.
    #[error("unknown order type token: {0:?}")]
    UnknownOrderType(String),

    /// Order type is recognized but cannot be replicated.
    #[error("order type {0:?} cannot be replicated")]
    UnsupportedOrderType(String),

    /// Time in force token is not recognized.
    #[error("unknown time in force token: {0:?}")]
    UnknownTimeInForce(String),

    /// Source order carries no quantity (notional order).
    #[error("order has no quantity")]
    MissingQuantity,

    /// Source quantity is zero or negative.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// A price required by the order type is absent or not positive.
    #[error("{order_type} order requires a positive {field}")]
    MissingPrice {
        /// Order type needing the price
        order_type: OrderType,
        /// Which price is missing ("price" or "stop_price")
        field: &'static str,
    },
}

// =============================================================================
// Translator
// =============================================================================

/// Translates source events into destination order requests.
#[derive(Clone)]
pub struct OrderTranslator {
    normalizer: Arc<dyn SymbolNormalizer>,
}

impl std::fmt::Debug for OrderTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderTranslator").finish_non_exhaustive()
    }
}

impl OrderTranslator {
    /// Create a translator using the destination's symbol normalizer.
    #[must_use]
    pub fn new(normalizer: Arc<dyn SymbolNormalizer>) -> Self {
        Self { normalizer }
    }

    /// Build the destination order request for a source event.
    ///
    /// # Errors
    ///
    /// Returns `TranslationError` if any required field cannot be parsed or
    /// the order type is missing a price it needs.
    pub fn translate(&self, event: &OrderEvent) -> Result<OrderRequest, TranslationError> {
        let symbol = self.normalizer.normalize(&event.symbol)?;
        let side = parse_side(&event.side)?;
        let order_type = parse_order_type(&event.order_type)?;
        let time_in_force = event
            .time_in_force
            .as_deref()
            .map_or(Ok(TimeInForce::Day), parse_time_in_force)?;

        let quantity = event.quantity.ok_or(TranslationError::MissingQuantity)?;
        if quantity <= Decimal::ZERO {
            return Err(TranslationError::NonPositiveQuantity(quantity));
        }

        let price = if order_type.requires_limit_price() {
            Some(require_positive(event.price, order_type, "price")?)
        } else {
            None
        };

        let stop_price = if order_type.requires_stop_price() {
            Some(require_positive(event.stop_price, order_type, "stop_price")?)
        } else {
            None
        };

        Ok(OrderRequest {
            symbol,
            side,
            quantity,
            price,
            stop_price,
            order_type,
            time_in_force,
            position_intent: PositionIntent::Open,
        })
    }
}

fn require_positive(
    value: Option<Decimal>,
    order_type: OrderType,
    field: &'static str,
) -> Result<Decimal, TranslationError> {
    value
        .filter(|p| *p > Decimal::ZERO)
        .ok_or(TranslationError::MissingPrice { order_type, field })
}

/// Lowercase a token and fold `-` and spaces into `_`.
fn canonical_token(token: &str) -> String {
    token
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn parse_side(token: &str) -> Result<OrderSide, TranslationError> {
    match canonical_token(token).as_str() {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        _ => Err(TranslationError::UnknownSide(token.to_string())),
    }
}

fn parse_order_type(token: &str) -> Result<OrderType, TranslationError> {
    match canonical_token(token).as_str() {
        "market" => Ok(OrderType::Market),
        "limit" => Ok(OrderType::Limit),
        "stop" => Ok(OrderType::Stop),
        "stop_limit" => Ok(OrderType::StopLimit),
        "trailing_stop" => Err(TranslationError::UnsupportedOrderType(token.to_string())),
        _ => Err(TranslationError::UnknownOrderType(token.to_string())),
    }
}

fn parse_time_in_force(token: &str) -> Result<TimeInForce, TranslationError> {
    match canonical_token(token).as_str() {
        "day" => Ok(TimeInForce::Day),
        "gtc" => Ok(TimeInForce::Gtc),
        "opg" => Ok(TimeInForce::Opg),
        "cls" => Ok(TimeInForce::Cls),
        "ioc" => Ok(TimeInForce::Ioc),
        "fok" => Ok(TimeInForce::Fok),
        _ => Err(TranslationError::UnknownTimeInForce(token.to_string())),
    }
}
