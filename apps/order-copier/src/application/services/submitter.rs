//! Order Submitter
//!
//! Single-attempt order placement on the destination account.

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{OrderAck, OrderGateway, SubmissionError};
use crate::domain::order::OrderRequest;
use crate::infrastructure::metrics;

/// Places translated orders through an [`OrderGateway`].
///
/// Each request is submitted exactly once. No timeout is layered on top
/// of the gateway's own, so an in-flight placement always runs to
/// completion.
#[derive(Clone)]
pub struct OrderSubmitter {
    gateway: Arc<dyn OrderGateway>,
}

impl std::fmt::Debug for OrderSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSubmitter").finish_non_exhaustive()
    }
}

impl OrderSubmitter {
    /// Create a submitter over the destination gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    /// Submit an order request.
    ///
    /// # Errors
    ///
    /// Returns the gateway's `SubmissionError` unchanged.
    pub async fn submit(&self, request: OrderRequest) -> Result<OrderAck, SubmissionError> {
        let started = Instant::now();
        let ack = self.gateway.place_order(request).await?;
        metrics::record_order_submitted(started.elapsed());
        Ok(ack)
    }
}
