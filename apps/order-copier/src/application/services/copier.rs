//! Copier Runtime
//!
//! Runs the stream lifecycle manager and the orchestrator side by side,
//! joined by a bounded channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::orchestrator::ReplicationOrchestrator;
use super::stream_lifecycle::{StreamError, StreamExit, StreamLifecycleManager};
use crate::application::ports::OrderStreamPort;

/// Fatal copier errors.
#[derive(Debug, thiserror::Error)]
pub enum CopierError {
    /// The source stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Replicate source events until shutdown or a fatal stream error.
///
/// When the stream stops, events already queued are still processed
/// before this returns.
///
/// # Errors
///
/// Returns `CopierError::Stream` if the stream cannot be established or
/// terminates.
pub async fn run_copier<S: OrderStreamPort>(
    stream: S,
    orchestrator: ReplicationOrchestrator,
    channel_capacity: usize,
    cancel: CancellationToken,
) -> Result<StreamExit, CopierError> {
    let (tx, rx) = mpsc::channel(channel_capacity.max(1));
    let mut manager = StreamLifecycleManager::new(stream);

    tracing::info!(channel_capacity, "Starting order copier");

    let (stream_result, processed) = tokio::join!(
        manager.run(tx, cancel.clone()),
        orchestrator.run(rx, cancel),
    );

    tracing::info!(processed, "Order copier stopped");
    Ok(stream_result?)
}
