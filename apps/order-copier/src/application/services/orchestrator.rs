//! Replication Orchestrator
//!
//! Drives each source event through filter, translator and submitter.
//! Per-event failures are logged and counted, never propagated.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::submitter::OrderSubmitter;
use crate::application::ports::{OrderAck, SubmissionError};
use crate::domain::order::{OrderEvent, OrderStatus};
use crate::domain::replication::{OrderTranslator, TranslationError, is_eligible};
use crate::infrastructure::metrics::{self, FailureStage};

/// What happened to one source event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Status not eligible for replication.
    Ignored,
    /// Event could not be turned into an order request.
    TranslationFailed(TranslationError),
    /// Destination refused or failed the order.
    SubmissionFailed(SubmissionError),
    /// Order placed on the destination.
    Submitted(OrderAck),
}

/// Sequential per-event replication pipeline.
#[derive(Debug, Clone)]
pub struct ReplicationOrchestrator {
    translator: OrderTranslator,
    submitter: OrderSubmitter,
}

impl ReplicationOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub const fn new(translator: OrderTranslator, submitter: OrderSubmitter) -> Self {
        Self {
            translator,
            submitter,
        }
    }

    /// Process one source event to completion.
    #[tracing::instrument(
        skip(self, event),
        fields(order_id = %event.order_id, symbol = %event.symbol, status = %event.status)
    )]
    pub async fn on_event(&self, event: OrderEvent) -> EventOutcome {
        if !is_eligible(&event) {
            tracing::trace!("Event not eligible, ignoring");
            metrics::record_event_ignored();
            return EventOutcome::Ignored;
        }

        if event.status == OrderStatus::PartiallyFilled {
            tracing::debug!(
                source_order_id = %event.order_id,
                "Partial fill replicated as a new open order"
            );
        }

        let request = match self.translator.translate(&event) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(stage = "translation", error = %e, "Dropping event");
                metrics::record_failure(FailureStage::Translation);
                return EventOutcome::TranslationFailed(e);
            }
        };

        let side = request.side;
        let quantity = request.quantity;
        match self.submitter.submit(request).await {
            Ok(ack) => {
                tracing::info!(
                    broker_order_id = %ack.broker_order_id,
                    %side,
                    %quantity,
                    status = %ack.status,
                    "Order replicated"
                );
                EventOutcome::Submitted(ack)
            }
            Err(e) => {
                tracing::error!(stage = "submission", error = %e, "Dropping event");
                metrics::record_failure(FailureStage::Submission);
                EventOutcome::SubmissionFailed(e)
            }
        }
    }

    /// Consume events in arrival order until the channel closes or
    /// cancellation is requested.
    ///
    /// Cancellation is checked only between events. Returns the number of
    /// events processed.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<OrderEvent>,
        cancel: CancellationToken,
    ) -> u64 {
        let mut processed = 0u64;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!(processed, "Orchestrator stopping on shutdown");
                    break;
                }

                next = events.recv() => {
                    let Some(event) = next else {
                        tracing::info!(processed, "Event channel closed, orchestrator stopping");
                        break;
                    };
                    self.on_event(event).await;
                    processed += 1;
                }
            }
        }

        processed
    }
}
