//! Order Copier Binary
//!
//! Replicates orders opened on a source account onto a destination account.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-copier
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `SOURCE_API_KEY`, `SOURCE_SECRET_KEY`: source account credentials
//! - `DEST_API_KEY`, `DEST_SECRET_KEY`: destination account credentials
//!
//! ## Optional
//! - `SOURCE_ENV`, `DEST_ENV`: PAPER | LIVE (default: PAPER)
//! - `COPIER_EVENT_CHANNEL_CAPACITY`: event channel bound (default: 256)
//! - `COPIER_HEARTBEAT_INTERVAL_SECS`: ping interval (default: 20)
//! - `COPIER_HEARTBEAT_TIMEOUT_SECS`: pong timeout (default: 20)
//! - `COPIER_HTTP_TIMEOUT_SECS`: order request timeout (default: 30)
//! - `COPIER_METRICS_PORT`: Prometheus metrics port, 0 disables (default: 9090)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: order-copier)
//! - `RUST_LOG`: Log filter (default: `order_copier=info,warn`)

use std::sync::Arc;

use anyhow::{Context, anyhow};
use order_copier::infrastructure::alpaca::{
    AlpacaOrderGateway, AlpacaSymbolNormalizer, TradeUpdatesConfig, TradeUpdatesStream,
};
use order_copier::infrastructure::telemetry;
use order_copier::{
    CopierConfig, OrderSubmitter, OrderTranslator, ReplicationOrchestrator, StreamExit,
    init_metrics, run_copier,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting order copier");

    let config = CopierConfig::from_env().context("invalid configuration")?;
    config.log_summary();

    init_metrics(config.runtime.metrics_port).context("failed to install metrics recorder")?;

    let stream_config = TradeUpdatesConfig::new(
        config.source.environment.trade_updates_url(),
        config.source.credentials.clone(),
    )
    .with_heartbeat(config.runtime.heartbeat());
    let stream = TradeUpdatesStream::new(stream_config);

    let gateway = AlpacaOrderGateway::new(
        config.destination.environment.trading_api_url(),
        config.destination.credentials.clone(),
        config.runtime.http_timeout,
    )
    .context("failed to build destination HTTP client")?;

    let translator = OrderTranslator::new(Arc::new(AlpacaSymbolNormalizer));
    let submitter = OrderSubmitter::new(Arc::new(gateway));
    let orchestrator = ReplicationOrchestrator::new(translator, submitter);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(await_shutdown(shutdown_token.clone()));

    let exit = run_copier(
        stream,
        orchestrator,
        config.runtime.event_channel_capacity,
        shutdown_token,
    )
    .await
    .context("order copier stopped")?;

    match exit {
        StreamExit::Cancelled => tracing::info!("Order copier shut down"),
        StreamExit::ConsumerClosed => tracing::warn!("Order copier stopped: consumer closed"),
    }
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Load .env file from the nearest ancestor directory that has one.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
