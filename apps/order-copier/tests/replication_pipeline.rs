//! Replication Pipeline Integration Tests
//!
//! Drives `run_copier` with a scripted source stream and a mocked
//! destination gateway.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mockall::{Sequence, mock};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use order_copier::infrastructure::alpaca::AlpacaSymbolNormalizer;
use order_copier::{
    CopierError, EventOutcome, OrderAck, OrderEvent, OrderGateway, OrderRequest, OrderSide,
    OrderStatus, OrderStreamPort, OrderSubmitter, OrderTranslator, OrderType, PositionIntent,
    ReplicationOrchestrator, StreamEnd, StreamError, StreamExit, StreamPortError,
    SubmissionError, TimeInForce, run_copier,
};

mock! {
    Gateway {}

    #[async_trait]
    impl OrderGateway for Gateway {
        async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, SubmissionError>;
    }
}

/// Source stream that replays a fixed list of events, then either ends or
/// idles until disconnected.
struct ScriptedStream {
    events: VecDeque<OrderEvent>,
    end: Option<StreamEnd>,
    disconnects: Arc<AtomicUsize>,
}

impl ScriptedStream {
    fn new(events: Vec<OrderEvent>, end: Option<StreamEnd>) -> Self {
        Self {
            events: events.into(),
            end,
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl OrderStreamPort for ScriptedStream {
    async fn connect(&mut self) -> Result<(), StreamPortError> {
        Ok(())
    }

    async fn subscribe_order_events(&mut self) -> Result<(), StreamPortError> {
        Ok(())
    }

    async fn next_event(&mut self) -> Result<OrderEvent, StreamEnd> {
        if let Some(event) = self.events.pop_front() {
            return Ok(event);
        }
        match self.end.take() {
            Some(end) => Err(end),
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Gateway whose placement waits until the test releases it.
#[derive(Default)]
struct HeldGateway {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

#[async_trait]
impl OrderGateway for HeldGateway {
    async fn place_order(&self, request: OrderRequest) -> Result<OrderAck, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(ack_for(&request))
    }
}

fn event(
    id: &str,
    symbol: &str,
    side: &str,
    order_type: &str,
    price: Option<Decimal>,
    status: &str,
) -> OrderEvent {
    OrderEvent {
        order_id: id.to_string(),
        symbol: symbol.to_string(),
        side: side.to_string(),
        quantity: Some(dec!(1.5)),
        price,
        stop_price: None,
        order_type: order_type.to_string(),
        time_in_force: Some("gtc".to_string()),
        status: OrderStatus::from_token(status),
    }
}

fn ack_for(request: &OrderRequest) -> OrderAck {
    OrderAck {
        broker_order_id: format!("dest-{}", request.symbol),
        client_order_id: "client-1".to_string(),
        status: "accepted".to_string(),
        symbol: request.symbol.to_string(),
        side: request.side.to_string(),
        quantity: Some(request.quantity),
    }
}

fn orchestrator(gateway: MockGateway) -> ReplicationOrchestrator {
    ReplicationOrchestrator::new(
        OrderTranslator::new(Arc::new(AlpacaSymbolNormalizer)),
        OrderSubmitter::new(Arc::new(gateway)),
    )
}

#[tokio::test]
async fn new_limit_order_is_replicated_as_open_order() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_place_order()
        .times(1)
        .withf(|request| {
            request.symbol.as_str() == "BTCUSDT"
                && request.side == OrderSide::Buy
                && request.quantity == dec!(1.5)
                && request.price == Some(dec!(30000))
                && request.order_type == OrderType::Limit
                && request.time_in_force == TimeInForce::Gtc
                && request.position_intent == PositionIntent::Open
        })
        .returning(|request| Ok(ack_for(&request)));

    let outcome = orchestrator(gateway)
        .on_event(event(
            "src-1",
            "BTCUSDT",
            "BUY",
            "LIMIT",
            Some(dec!(30000)),
            "NEW",
        ))
        .await;

    assert!(matches!(outcome, EventOutcome::Submitted(ack) if ack.broker_order_id == "dest-BTCUSDT"));
}

#[tokio::test]
async fn filled_event_is_not_submitted() {
    let mut gateway = MockGateway::new();
    gateway.expect_place_order().never();

    let outcome = orchestrator(gateway)
        .on_event(event("src-2", "AAPL", "buy", "market", None, "FILLED"))
        .await;

    assert!(matches!(outcome, EventOutcome::Ignored));
}

#[tokio::test]
async fn failures_do_not_stop_later_events() {
    let mut seq = Sequence::new();
    let mut gateway = MockGateway::new();
    gateway
        .expect_place_order()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|request| request.symbol.as_str() == "BTCUSDT")
        .returning(|request| Ok(ack_for(&request)));
    gateway
        .expect_place_order()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|request| request.symbol.as_str() == "AAPL")
        .returning(|_| {
            Err(SubmissionError::Rejected {
                reason: "insufficient buying power".to_string(),
            })
        });
    gateway
        .expect_place_order()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|request| request.symbol.as_str() == "MSFT" && request.side == OrderSide::Sell)
        .returning(|request| Ok(ack_for(&request)));

    let stream = ScriptedStream::new(
        vec![
            event("1", "BTCUSDT", "BUY", "LIMIT", Some(dec!(30000)), "NEW"),
            event("2", "BTCUSDT", "BUY", "LIMIT", Some(dec!(30000)), "FILLED"),
            event("3", "ETHUSD", "sideways", "market", None, "NEW"),
            event("4", "AAPL", "buy", "market", None, "NEW"),
            event("5", "MSFT", "sell", "market", None, "PARTIALLY_FILLED"),
        ],
        Some(StreamEnd::RemoteClosed),
    );
    let disconnects = Arc::clone(&stream.disconnects);

    let result = run_copier(stream, orchestrator(gateway), 8, CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(CopierError::Stream(StreamError::Terminated(StreamEnd::RemoteClosed)))
    ));
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn shutdown_while_idle_exits_cleanly() {
    let mut gateway = MockGateway::new();
    gateway.expect_place_order().never();

    let stream = ScriptedStream::new(Vec::new(), None);
    let disconnects = Arc::clone(&stream.disconnects);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let exit = tokio::time::timeout(
        Duration::from_secs(5),
        run_copier(stream, orchestrator(gateway), 8, cancel),
    )
    .await
    .expect("copier should stop after cancellation")
    .unwrap();

    assert_eq!(exit, StreamExit::Cancelled);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn every_partial_fill_is_replicated() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_place_order()
        .times(3)
        .returning(|request| Ok(ack_for(&request)));

    let stream = ScriptedStream::new(
        vec![
            event("same", "AAPL", "buy", "market", None, "NEW"),
            event("same", "AAPL", "buy", "market", None, "PARTIALLY_FILLED"),
            event("same", "AAPL", "buy", "market", None, "PARTIALLY_FILLED"),
        ],
        Some(StreamEnd::RemoteClosed),
    );

    let result = run_copier(stream, orchestrator(gateway), 1, CancellationToken::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn shutdown_lets_in_flight_submission_finish() {
    let gateway = Arc::new(HeldGateway::default());
    let orchestrator = ReplicationOrchestrator::new(
        OrderTranslator::new(Arc::new(AlpacaSymbolNormalizer)),
        OrderSubmitter::new(gateway.clone()),
    );

    let stream = ScriptedStream::new(
        vec![
            event("first", "AAPL", "buy", "market", None, "NEW"),
            event("queued", "MSFT", "buy", "market", None, "NEW"),
        ],
        None,
    );
    let disconnects = Arc::clone(&stream.disconnects);
    let cancel = CancellationToken::new();

    let copier = tokio::spawn(run_copier(stream, orchestrator, 8, cancel.clone()));

    tokio::time::timeout(Duration::from_secs(5), gateway.started.notified())
        .await
        .expect("first order should reach the gateway");
    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(gateway.completed.load(Ordering::SeqCst), 0);

    gateway.release.notify_one();

    let exit = tokio::time::timeout(Duration::from_secs(5), copier)
        .await
        .expect("copier should stop once the placement returns")
        .unwrap()
        .unwrap();

    assert_eq!(exit, StreamExit::Cancelled);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.completed.load(Ordering::SeqCst), 1);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}
