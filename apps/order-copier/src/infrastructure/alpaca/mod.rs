//! Alpaca Adapters
//!
//! Exchange client for both sides of the copier:
//!
//! - **Trade Updates** (source): order events over the trading websocket
//! - **Orders** (destination): order placement over the trading REST API
//! - **Symbols**: symbol normalization for the destination

pub mod api_types;
pub mod auth;
pub mod codec;
pub mod heartbeat;
pub mod messages;
pub mod orders;
pub mod symbols;
pub mod trading;

pub use auth::{AUTH_TIMEOUT, AuthError, AuthHandler, AuthState, Credentials};
pub use codec::{CodecError, JsonCodec};
pub use heartbeat::{HeartbeatConfig, HeartbeatMonitor, HeartbeatSignal, HeartbeatState};
pub use orders::AlpacaOrderGateway;
pub use symbols::AlpacaSymbolNormalizer;
pub use trading::{TradeUpdatesConfig, TradeUpdatesStream};
