//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the replication services and the port interfaces
//! that define how the pipeline talks to the source and destination
//! exchanges.

/// Port interfaces for the exchange connections.
pub mod ports;

/// Application services: submission, orchestration and stream lifecycle.
pub mod services;
