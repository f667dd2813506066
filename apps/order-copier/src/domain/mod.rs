//! Domain Layer - Order types and replication rules.
//!
//! This layer contains the order event and order request types together
//! with the pure replication rules (eligibility filter and translation).
//! Nothing here performs I/O.

/// Order events, order requests and their value types.
pub mod order;

/// Replication rules: which events are copied and how they are translated.
pub mod replication;
