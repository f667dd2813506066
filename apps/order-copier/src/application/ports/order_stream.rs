//! Order Stream Port (Driven Port)
//!
//! Interface for the source account's order event stream.

use async_trait::async_trait;

use crate::domain::order::OrderEvent;

/// Failure to establish or subscribe the stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamPortError {
    /// Transport could not be opened.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Session authentication refused.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Order event subscription refused.
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// Handshake step did not complete in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// Operation needs a connected session.
    #[error("stream is not connected")]
    NotConnected,
}

/// Why an established stream stopped delivering events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamEnd {
    /// The exchange closed the connection.
    #[error("remote closed the stream")]
    RemoteClosed,

    /// Transport error while reading.
    #[error("transport error: {0}")]
    Transport(String),

    /// No pong within the heartbeat timeout.
    #[error("heartbeat timeout")]
    HeartbeatTimeout,
}

/// Port for the source order event stream.
///
/// Call order: `connect`, `subscribe_order_events`, then `next_event`
/// until it returns a [`StreamEnd`]. `disconnect` may be called at any
/// point and any number of times.
#[async_trait]
pub trait OrderStreamPort: Send {
    /// Open an authenticated session.
    async fn connect(&mut self) -> Result<(), StreamPortError>;

    /// Subscribe to order lifecycle events.
    async fn subscribe_order_events(&mut self) -> Result<(), StreamPortError>;

    /// Wait for the next order event.
    async fn next_event(&mut self) -> Result<OrderEvent, StreamEnd>;

    /// Close the session. Idempotent.
    async fn disconnect(&mut self);
}
