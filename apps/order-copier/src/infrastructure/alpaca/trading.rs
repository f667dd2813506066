//! Trade Updates Stream
//!
//! [`OrderStreamPort`] over Alpaca's trading websocket. Each trade update
//! becomes an [`OrderEvent`]; frames that cannot be decoded or converted are
//! logged and skipped.
//!
//! # Stream URL
//!
//! - Production: `wss://api.alpaca.markets/stream`
//! - Sandbox: `wss://paper-api.alpaca.markets/stream`
//!
//! # Protocol
//!
//! `connect` opens the socket and authenticates within [`AUTH_TIMEOUT`];
//! `subscribe_order_events` sends the `listen` request and waits for the
//! `listening` confirmation. Alpaca delivers JSON in both text and binary
//! frames.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::auth::{AUTH_TIMEOUT, AuthHandler, Credentials};
use super::codec::JsonCodec;
use super::heartbeat::{HeartbeatConfig, HeartbeatMonitor, HeartbeatSignal, HeartbeatState};
use super::messages::AlpacaMessage;
use crate::application::ports::{OrderStreamPort, StreamEnd, StreamPortError};
use crate::domain::order::OrderEvent;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the trade updates stream.
#[derive(Debug, Clone)]
pub struct TradeUpdatesConfig {
    /// WebSocket URL.
    pub url: String,
    /// Source account credentials.
    pub credentials: Credentials,
    /// Heartbeat configuration.
    pub heartbeat: HeartbeatConfig,
    /// Deadline for each handshake step.
    pub handshake_timeout: Duration,
}

impl TradeUpdatesConfig {
    /// Create a configuration with default heartbeat and handshake timing.
    #[must_use]
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            heartbeat: HeartbeatConfig::default(),
            handshake_timeout: AUTH_TIMEOUT,
        }
    }

    /// Use a custom heartbeat.
    #[must_use]
    pub const fn with_heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.heartbeat = heartbeat;
        self
    }
}

// =============================================================================
// Session
// =============================================================================

/// One live socket and its heartbeat monitor.
struct Session {
    socket: Socket,
    heartbeat: Arc<HeartbeatState>,
    signals: mpsc::Receiver<HeartbeatSignal>,
    monitor_cancel: CancellationToken,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.monitor_cancel.cancel();
    }
}

/// Read the next data frame, answering pings and tracking liveness.
///
/// Returns `Ok(None)` for control frames.
async fn read_frame(
    socket: &mut Socket,
    heartbeat: &HeartbeatState,
) -> Result<Option<String>, StreamEnd> {
    match socket.next().await {
        Some(Ok(Message::Text(text))) => {
            heartbeat.record_pong();
            Ok(Some(text.as_str().to_owned()))
        }
        Some(Ok(Message::Binary(data))) => {
            heartbeat.record_pong();
            match std::str::from_utf8(&data) {
                Ok(text) => Ok(Some(text.to_owned())),
                Err(_) => {
                    tracing::warn!(len = data.len(), "Skipping non-UTF8 binary frame");
                    Ok(None)
                }
            }
        }
        Some(Ok(Message::Pong(_))) => {
            heartbeat.record_pong();
            Ok(None)
        }
        Some(Ok(Message::Ping(payload))) => {
            socket
                .send(Message::Pong(payload))
                .await
                .map_err(|e| StreamEnd::Transport(e.to_string()))?;
            Ok(None)
        }
        Some(Ok(Message::Close(frame))) => {
            tracing::info!(?frame, "Server sent close frame");
            Err(StreamEnd::RemoteClosed)
        }
        Some(Ok(Message::Frame(_))) => Ok(None),
        Some(Err(e)) => Err(StreamEnd::Transport(e.to_string())),
        None => Err(StreamEnd::RemoteClosed),
    }
}

/// Queue every convertible trade update in a decoded frame.
///
/// Returns the non-trade-update messages for the caller to inspect.
fn absorb_frame(
    codec: &JsonCodec,
    pending: &mut VecDeque<OrderEvent>,
    text: &str,
) -> Vec<AlpacaMessage> {
    let messages = match codec.decode(text) {
        Ok(messages) => messages,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping undecodable frame");
            return Vec::new();
        }
    };

    let mut control = Vec::new();
    for message in messages {
        match message {
            AlpacaMessage::TradeUpdate(update) => match OrderEvent::try_from(update.as_ref()) {
                Ok(event) => {
                    tracing::trace!(
                        event = %update.data.event,
                        order_id = %event.order_id,
                        "Trade update queued"
                    );
                    pending.push_back(event);
                }
                Err(e) => {
                    tracing::warn!(
                        order_id = %update.data.order.id,
                        error = %e,
                        "Skipping unconvertible trade update"
                    );
                }
            },
            other => control.push(other),
        }
    }
    control
}

/// Queue trade updates from a frame read after subscription; control
/// messages are only logged.
fn absorb_live_frame(codec: &JsonCodec, pending: &mut VecDeque<OrderEvent>, text: &str) {
    for message in absorb_frame(codec, pending, text) {
        match message {
            AlpacaMessage::Error(error) => {
                tracing::warn!(code = error.code, msg = %error.msg, "Trade updates error");
            }
            other => tracing::debug!(?other, "Ignoring control message"),
        }
    }
}

// =============================================================================
// Trade Updates Stream
// =============================================================================

/// Source account order stream over the trading websocket.
///
/// Dropping the stream closes the socket and stops the heartbeat.
pub struct TradeUpdatesStream {
    config: TradeUpdatesConfig,
    codec: JsonCodec,
    auth: AuthHandler,
    session: Option<Session>,
    pending: VecDeque<OrderEvent>,
}

impl std::fmt::Debug for TradeUpdatesStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeUpdatesStream")
            .field("url", &self.config.url)
            .field("auth", &self.auth.state())
            .field("connected", &self.session.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl TradeUpdatesStream {
    /// Create an unconnected stream.
    #[must_use]
    pub fn new(config: TradeUpdatesConfig) -> Self {
        let auth = AuthHandler::new(config.credentials.clone());
        Self {
            config,
            codec: JsonCodec::new(),
            auth,
            session: None,
            pending: VecDeque::new(),
        }
    }

    /// Whether a socket is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn send_json<T: serde::Serialize>(
        socket: &mut Socket,
        codec: &JsonCodec,
        value: &T,
    ) -> Result<(), String> {
        let json = codec.encode(value).map_err(|e| e.to_string())?;
        socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| e.to_string())
    }

    async fn authenticate(&mut self, socket: &mut Socket) -> Result<(), StreamPortError> {
        let request = self.auth.create_auth_request();
        Self::send_json(socket, &self.codec, &request)
            .await
            .map_err(StreamPortError::Connection)?;

        let liveness = HeartbeatState::new();
        loop {
            let Some(text) = read_frame(socket, &liveness)
                .await
                .map_err(|e| StreamPortError::Connection(e.to_string()))?
            else {
                continue;
            };

            for message in absorb_frame(&self.codec, &mut self.pending, &text) {
                match message {
                    AlpacaMessage::Authorization(response) => {
                        return self
                            .auth
                            .on_authorization(&response)
                            .map_err(|e| StreamPortError::Authentication(e.to_string()));
                    }
                    AlpacaMessage::Error(error) => {
                        let err = self.auth.on_error(&error);
                        return Err(StreamPortError::Authentication(err.to_string()));
                    }
                    AlpacaMessage::Listening(_) | AlpacaMessage::TradeUpdate(_) => {}
                }
            }
        }
    }

    async fn await_listening(
        session: &mut Session,
        codec: &JsonCodec,
        pending: &mut VecDeque<OrderEvent>,
    ) -> Result<(), StreamPortError> {
        loop {
            let Some(text) = read_frame(&mut session.socket, &session.heartbeat)
                .await
                .map_err(|e| StreamPortError::Subscription(e.to_string()))?
            else {
                continue;
            };

            for message in absorb_frame(codec, pending, &text) {
                match message {
                    AlpacaMessage::Listening(listening) if listening.includes_trade_updates() => {
                        tracing::info!(streams = ?listening.data.streams, "Listening to trade updates");
                        return Ok(());
                    }
                    AlpacaMessage::Listening(listening) => {
                        return Err(StreamPortError::Subscription(format!(
                            "trade_updates not confirmed, active streams: {:?}",
                            listening.data.streams
                        )));
                    }
                    AlpacaMessage::Error(error) => {
                        return Err(StreamPortError::Subscription(format!(
                            "{} ({})",
                            error.msg, error.code
                        )));
                    }
                    AlpacaMessage::Authorization(_) | AlpacaMessage::TradeUpdate(_) => {}
                }
            }
        }
    }
}

#[async_trait]
impl OrderStreamPort for TradeUpdatesStream {
    async fn connect(&mut self) -> Result<(), StreamPortError> {
        if self.session.is_some() {
            return Ok(());
        }

        tracing::info!(url = %self.config.url, "Connecting to trade updates stream");
        let (mut socket, _response) = tokio_tungstenite::connect_async(self.config.url.as_str())
            .await
            .map_err(|e| StreamPortError::Connection(e.to_string()))?;

        match tokio::time::timeout(self.config.handshake_timeout, self.authenticate(&mut socket))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                self.auth.reset();
                return Err(StreamPortError::Timeout("authorization"));
            }
        }
        tracing::info!(key = %self.config.credentials.key(), "Trade updates authenticated");

        let heartbeat = Arc::new(HeartbeatState::new());
        let (signal_tx, signals) = mpsc::channel(4);
        let monitor_cancel = CancellationToken::new();
        HeartbeatMonitor::new(
            self.config.heartbeat,
            heartbeat.clone(),
            signal_tx,
            monitor_cancel.clone(),
        )
        .spawn();

        self.session = Some(Session {
            socket,
            heartbeat,
            signals,
            monitor_cancel,
        });
        Ok(())
    }

    async fn subscribe_order_events(&mut self) -> Result<(), StreamPortError> {
        let request = self
            .auth
            .create_listen_request()
            .map_err(|_| StreamPortError::NotConnected)?;
        let session = self.session.as_mut().ok_or(StreamPortError::NotConnected)?;

        Self::send_json(&mut session.socket, &self.codec, &request)
            .await
            .map_err(StreamPortError::Subscription)?;

        tokio::time::timeout(
            self.config.handshake_timeout,
            Self::await_listening(session, &self.codec, &mut self.pending),
        )
        .await
        .map_err(|_| StreamPortError::Timeout("listening confirmation"))?
    }

    async fn next_event(&mut self) -> Result<OrderEvent, StreamEnd> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }

            let Some(session) = self.session.as_mut() else {
                return Err(StreamEnd::Transport("stream is not connected".to_string()));
            };

            tokio::select! {
                signal = session.signals.recv() => match signal {
                    Some(HeartbeatSignal::Ping) => {
                        session.heartbeat.mark_ping_sent();
                        session
                            .socket
                            .send(Message::Ping(Vec::new().into()))
                            .await
                            .map_err(|e| StreamEnd::Transport(e.to_string()))?;
                    }
                    Some(HeartbeatSignal::Expired) => {
                        // the pong may be sitting unread if the consumer was slow
                        while let Some(frame) =
                            read_frame(&mut session.socket, &session.heartbeat).now_or_never()
                        {
                            if let Some(text) = frame? {
                                absorb_live_frame(&self.codec, &mut self.pending, &text);
                            }
                        }
                        if session.heartbeat.is_expired(self.config.heartbeat.pong_timeout) {
                            return Err(StreamEnd::HeartbeatTimeout);
                        }
                        tracing::debug!("Buffered frames proved liveness, keeping stream");
                    }
                    None => {
                        return Err(StreamEnd::Transport("heartbeat monitor stopped".to_string()));
                    }
                },
                frame = read_frame(&mut session.socket, &session.heartbeat) => {
                    if let Some(text) = frame? {
                        absorb_live_frame(&self.codec, &mut self.pending, &text);
                    }
                }
            }
        }
    }

    async fn disconnect(&mut self) {
        self.pending.clear();
        self.auth.reset();

        let Some(mut session) = self.session.take() else {
            return;
        };
        session.monitor_cancel.cancel();
        if tokio::time::timeout(CLOSE_TIMEOUT, session.socket.close(None))
            .await
            .is_err()
        {
            tracing::debug!("Close handshake timed out, dropping socket");
        }
        tracing::info!("Trade updates stream disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TradeUpdatesConfig {
        TradeUpdatesConfig::new(
            "ws://127.0.0.1:1/stream",
            Credentials::new("key", "secret").unwrap(),
        )
    }

    #[test]
    fn config_defaults() {
        let config = config();
        assert_eq!(config.handshake_timeout, AUTH_TIMEOUT);
        assert_eq!(config.heartbeat, HeartbeatConfig::default());
    }

    #[test]
    fn absorb_frame_queues_trade_updates_and_returns_control() {
        let codec = JsonCodec::new();
        let mut pending = VecDeque::new();
        let text = r#"[
            {"stream":"trade_updates","data":{"event":"new","order":{
                "id":"o-1","symbol":"AAPL","qty":"1","type":"market","side":"buy","status":"new"}}},
            {"T":"error","code":500,"msg":"internal"}
        ]"#;

        let control = absorb_frame(&codec, &mut pending, text);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].order_id, "o-1");
        assert!(matches!(control.as_slice(), [AlpacaMessage::Error(_)]));
    }

    #[test]
    fn absorb_frame_skips_garbage() {
        let codec = JsonCodec::new();
        let mut pending = VecDeque::new();

        let control = absorb_frame(&codec, &mut pending, "not json");

        assert!(pending.is_empty());
        assert!(control.is_empty());
    }

    #[tokio::test]
    async fn disconnect_without_session_is_noop() {
        let mut stream = TradeUpdatesStream::new(config());
        stream.disconnect().await;
        stream.disconnect().await;
        assert!(!stream.is_connected());
    }

    #[tokio::test]
    async fn subscribe_before_connect_fails() {
        let mut stream = TradeUpdatesStream::new(config());
        let err = stream.subscribe_order_events().await.unwrap_err();
        assert_eq!(err, StreamPortError::NotConnected);
    }

    #[tokio::test]
    async fn next_event_before_connect_fails() {
        let mut stream = TradeUpdatesStream::new(config());
        assert!(matches!(
            stream.next_event().await,
            Err(StreamEnd::Transport(_))
        ));
    }
}
