//! Order Gateway Port (Driven Port)
//!
//! Interface for placing orders on the destination account.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderRequest;

/// Acknowledgment from the destination after order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Destination-assigned order ID.
    pub broker_order_id: String,
    /// Client order ID assigned by the destination.
    pub client_order_id: String,
    /// Status reported at acceptance (e.g. "accepted", "new").
    pub status: String,
    /// Symbol as accepted.
    pub symbol: String,
    /// Side as accepted.
    pub side: String,
    /// Quantity as accepted, if reported.
    pub quantity: Option<Decimal>,
}

/// Order placement error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Order rejected by the destination.
    #[error("Order rejected: {reason}")]
    Rejected {
        /// Rejection reason.
        reason: String,
    },

    /// Credentials refused.
    #[error("Destination credentials refused")]
    Unauthorized,

    /// Rate limited.
    #[error("Rate limited by destination")]
    RateLimited,

    /// Transport failure before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be parsed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other non-success response.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error details.
        message: String,
    },
}

/// Port for placing orders on the destination account.
///
/// Implementations place each request at most once; they must not retry.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place a new order.
    async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, SubmissionError>;
}
