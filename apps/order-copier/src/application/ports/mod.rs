//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `OrderStreamPort`: order lifecycle events from the source account
//! - `OrderGateway`: order placement on the destination account

mod order_gateway;
mod order_stream;

pub use order_gateway::{OrderAck, OrderGateway, SubmissionError};
pub use order_stream::{OrderStreamPort, StreamEnd, StreamPortError};
