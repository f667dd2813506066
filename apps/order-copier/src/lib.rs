#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Order Copier - Order Replication Between Accounts
//!
//! Watches a source account's order stream and re-submits every newly
//! opened or partially filled order as an open order on a destination
//! account.
//!
//! # Layers (inside to outside)
//!
//! - **Domain**: Order types and replication rules
//!   - `order`: Order events, order requests, sides, types, time in force
//!   - `replication`: Eligibility filter and order translation
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for the source stream and the destination gateway
//!   - `services`: Submission, orchestration and stream lifecycle
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `alpaca`: Trade updates WebSocket, order REST client, symbols
//!   - `config`: Configuration from the environment
//!   - `metrics`: Prometheus metrics
//!   - `telemetry`: Tracing subscriber and OTLP export
//!
//! # Data Flow
//!
//! ```text
//! source trade_updates WS
//!         |
//!   StreamLifecycleManager --(bounded mpsc)--> ReplicationOrchestrator
//!                                                 | filter
//!                                                 | translate
//!                                                 v
//!                                           OrderSubmitter --> destination REST
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Order types and replication rules with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::order::{
    OrderEvent, OrderRequest, OrderSide, OrderStatus, OrderType, PositionIntent, Symbol,
    TimeInForce,
};
pub use domain::replication::{
    OrderTranslator, SymbolError, SymbolNormalizer, TranslationError, is_eligible,
};

// Ports and services
pub use application::ports::{
    OrderAck, OrderGateway, OrderStreamPort, StreamEnd, StreamPortError, SubmissionError,
};
pub use application::services::{
    CopierError, EventOutcome, OrderSubmitter, ReplicationOrchestrator, StreamError, StreamExit,
    StreamLifecycleManager, StreamState, run_copier,
};

// Infrastructure config
pub use infrastructure::config::{
    AccountSettings, ConfigError, CopierConfig, Environment, RuntimeSettings,
};

// Metrics
pub use infrastructure::metrics::{MetricsError, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
