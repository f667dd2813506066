//! Heartbeat Monitor
//!
//! Keeps the trading stream honest: a ping is requested every interval and
//! the stream is declared dead when a pong is outstanding for longer than
//! the timeout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ping cadence and pong deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// How long a pong may be outstanding.
    pub pong_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(20), Duration::from_secs(20))
    }
}

impl HeartbeatConfig {
    /// Create a configuration.
    #[must_use]
    pub const fn new(ping_interval: Duration, pong_timeout: Duration) -> Self {
        Self {
            ping_interval,
            pong_timeout,
        }
    }
}

/// Signals sent from the monitor to the stream reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatSignal {
    /// Send a ping frame now.
    Ping,
    /// Pong deadline missed.
    Expired,
}

/// Liveness bookkeeping shared by the monitor and the reader.
#[derive(Debug)]
pub struct HeartbeatState {
    last_pong: RwLock<Instant>,
    awaiting_pong: AtomicBool,
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatState {
    /// Fresh state: no pong outstanding.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_pong: RwLock::new(Instant::now()),
            awaiting_pong: AtomicBool::new(false),
        }
    }

    /// A pong (or any frame proving liveness) arrived.
    pub fn record_pong(&self) {
        *self.last_pong.write() = Instant::now();
        self.awaiting_pong.store(false, Ordering::SeqCst);
    }

    /// A ping was written to the socket.
    pub fn mark_ping_sent(&self) {
        self.awaiting_pong.store(true, Ordering::SeqCst);
    }

    /// Whether a pong is outstanding.
    #[must_use]
    pub fn is_awaiting_pong(&self) -> bool {
        self.awaiting_pong.load(Ordering::SeqCst)
    }

    /// Time since the last pong.
    #[must_use]
    pub fn since_last_pong(&self) -> Duration {
        self.last_pong.read().elapsed()
    }

    /// Whether the pong deadline has passed.
    #[must_use]
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.is_awaiting_pong() && self.since_last_pong() > timeout
    }
}

/// Periodic liveness check for one connection.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    config: HeartbeatConfig,
    state: Arc<HeartbeatState>,
    signals: mpsc::Sender<HeartbeatSignal>,
    cancel: CancellationToken,
}

impl HeartbeatMonitor {
    /// Create a monitor.
    #[must_use]
    pub const fn new(
        config: HeartbeatConfig,
        state: Arc<HeartbeatState>,
        signals: mpsc::Sender<HeartbeatSignal>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            state,
            signals,
            cancel,
        }
    }

    /// Run the monitor on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Tick until cancelled or the reader goes away.
    ///
    /// A missed deadline is reported and ticking continues; the reader
    /// decides whether the connection is dead.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.ping_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // interval fires immediately; the first ping waits one period
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Heartbeat monitor cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let signal = if self.state.is_expired(self.config.pong_timeout) {
                tracing::warn!(
                    since_pong_secs = self.state.since_last_pong().as_secs(),
                    timeout_secs = self.config.pong_timeout.as_secs(),
                    "Heartbeat deadline missed"
                );
                HeartbeatSignal::Expired
            } else {
                HeartbeatSignal::Ping
            };

            if self.signals.send(signal).await.is_err() {
                tracing::debug!("Heartbeat reader gone, stopping monitor");
                return;
            }
        }
    }
}
