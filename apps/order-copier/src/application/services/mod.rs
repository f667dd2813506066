//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `OrderSubmitter`: places translated orders through the gateway
//! - `ReplicationOrchestrator`: filter, translate and submit per event
//! - `StreamLifecycleManager`: owns the source stream session
//! - `run_copier`: wires the manager to the orchestrator

mod copier;
mod orchestrator;
mod stream_lifecycle;
mod submitter;

pub use copier::{CopierError, run_copier};
pub use orchestrator::{EventOutcome, ReplicationOrchestrator};
pub use stream_lifecycle::{StreamError, StreamExit, StreamLifecycleManager, StreamState};
pub use submitter::OrderSubmitter;
