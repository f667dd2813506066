//! Stream Lifecycle Manager
//!
//! Owns the source [`OrderStreamPort`] session and forwards its events to
//! the orchestrator channel.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──run()──► Connecting ──subscribed──► Streaming
//!       ▲                     │                          │
//!       │                     ▼                          ▼
//!       └────────────────── Closing ◄──── cancel / stream end / error
//! ```
//!
//! The port is disconnected on every exit path.

use std::fmt;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{OrderStreamPort, StreamEnd, StreamPortError};
use crate::domain::order::OrderEvent;
use crate::infrastructure::metrics;

/// Stream session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// No session.
    #[default]
    Disconnected,
    /// Opening and authenticating the session.
    Connecting,
    /// Subscribed and forwarding events.
    Streaming,
    /// Releasing the session.
    Closing,
}

impl StreamState {
    /// Numeric code for the state gauge.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Streaming => 2,
            Self::Closing => 3,
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Fatal stream errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Session could not be established.
    #[error("stream connection failed: {0}")]
    Connection(StreamPortError),

    /// Order event subscription failed.
    #[error("order event subscription failed: {0}")]
    Subscription(StreamPortError),

    /// Established stream stopped.
    #[error("stream terminated: {0}")]
    Terminated(StreamEnd),
}

/// Clean stop reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamExit {
    /// Shutdown was requested.
    Cancelled,
    /// The orchestrator dropped its receiver.
    ConsumerClosed,
}

/// Runs one source stream session.
#[derive(Debug)]
pub struct StreamLifecycleManager<S> {
    stream: S,
    state: watch::Sender<StreamState>,
}

impl<S: OrderStreamPort> StreamLifecycleManager<S> {
    /// Create a manager over an unconnected stream.
    #[must_use]
    pub fn new(stream: S) -> Self {
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self { stream, state }
    }

    /// Watch state transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Connect, subscribe and forward events until cancelled or the
    /// stream ends.
    ///
    /// # Errors
    ///
    /// Returns `StreamError` when connecting or subscribing fails, or when
    /// the established stream terminates.
    pub async fn run(
        &mut self,
        events: mpsc::Sender<OrderEvent>,
        cancel: CancellationToken,
    ) -> Result<StreamExit, StreamError> {
        self.set_state(StreamState::Connecting);
        let result = self.forward(&events, &cancel).await;

        self.set_state(StreamState::Closing);
        self.stream.disconnect().await;
        self.set_state(StreamState::Disconnected);

        match &result {
            Ok(exit) => tracing::info!(?exit, "Order stream stopped"),
            Err(e) => tracing::error!(error = %e, "Order stream failed"),
        }
        result
    }

    async fn forward(
        &mut self,
        events: &mpsc::Sender<OrderEvent>,
        cancel: &CancellationToken,
    ) -> Result<StreamExit, StreamError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(StreamExit::Cancelled),
            connected = self.stream.connect() => connected.map_err(StreamError::Connection)?,
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(StreamExit::Cancelled),
            subscribed = self.stream.subscribe_order_events() => {
                subscribed.map_err(StreamError::Subscription)?;
            }
        }

        self.set_state(StreamState::Streaming);

        loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(StreamExit::Cancelled),
                next = self.stream.next_event() => next.map_err(StreamError::Terminated)?,
            };

            tracing::debug!(
                order_id = %event.order_id,
                status = %event.status,
                "Order event received"
            );
            metrics::record_event_received(event.status.as_str());

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(StreamExit::Cancelled),
                sent = events.send(event) => {
                    if sent.is_err() {
                        return Ok(StreamExit::ConsumerClosed);
                    }
                }
            }
        }
    }

    fn set_state(&self, state: StreamState) {
        self.state.send_replace(state);
        metrics::set_stream_state(state.code());
        tracing::debug!(%state, "Stream state changed");
    }
}
