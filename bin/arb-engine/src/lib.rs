//! Engine binary. `run` is the Supervisor (component C6): it owns the
//! strict startup order, wires every component's channels together, and
//! drives the shutdown sequence on a signal or a fatal error.

pub mod cli;

use std::sync::Arc;

use alloy_primitives::U256;
use arb_broadcaster::Broadcaster;
use arb_evaluator::{Evaluator, PricingParams};
use arb_hydrator::{AlloyAggregator, hydrate};
use arb_metrics::{METRICS_ENABLED, initialize_prometheus_metrics};
use arb_store::Store;
use arb_subscriber::{Subscriber, SubscriberConfig};
use arb_types::BASE_DECIMALS;
use cli::Cli;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

/// Startup: Store, then Evaluator, then Broadcaster bound and wired to the
/// Evaluator's broadcast channel, then the Hydrator's one-shot pass, then
/// the Subscriber. Shutdown, triggered by Ctrl-C/SIGTERM or a fatal error:
/// stop the Subscriber, let the Evaluator quiesce (it does no I/O, so this
/// is immediate), then close the Broadcaster.
pub async fn run(cli: Cli) -> eyre::Result<()> {
    if cli.metrics_enabled {
        initialize_prometheus_metrics(cli.metrics_port).await?;
        let _ = METRICS_ENABLED.set(true);
    } else {
        let _ = METRICS_ENABLED.set(false);
    }

    let store = Arc::new(Store::load(&cli.db_name).await?);
    info!(pools = store.pools().len(), "catalog loaded");

    let (updates_tx, _updates_rx) = broadcast::channel::<arb_types::RateUpdate>(1024);
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();

    let params = PricingParams { start_amount_scaled: scale_start_amount(&cli.start_amount)?, fee_percent: cli.fee_percent };
    let evaluator =
        Arc::new(Evaluator::new(store.clone(), params, cli.start_currency.clone(), updates_tx.clone(), fatal_tx));

    let broadcaster = Broadcaster::bind(cli.web_server_port, updates_tx).await?;

    let aggregator = AlloyAggregator::connect_http(cli.https_url()?, cli.uniswap_viewer_address);
    hydrate(&store, &aggregator, cli.batch_size).await?;
    info!("hydration complete, starting subscriber");

    let subscriber_config = SubscriberConfig { ws_url: cli.wss_url()?, batch_size: cli.batch_size, ..Default::default() };
    let subscriber = Subscriber::new(subscriber_config);
    let batch_handles = subscriber.subscribe_all(store.pools(), evaluator.clone()).await;

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
        fatal = fatal_rx.recv() => {
            if let Some(fatal) = fatal {
                error!(error = %fatal, "fatal error, shutting down");
            }
        }
    }

    subscriber.shutdown();
    for handle in batch_handles {
        handle.abort();
    }
    broadcaster.close();
    broadcaster.stopped().await;
    info!("shutdown complete");

    Ok(())
}

fn scale_start_amount(raw: &str) -> eyre::Result<U256> {
    let amount: f64 = raw.parse().map_err(|e| eyre::eyre!("invalid START_AMOUNT {raw:?}: {e}"))?;
    let scaled = amount * 10f64.powi(BASE_DECIMALS as i32);
    format!("{scaled:.0}").parse().map_err(|e| eyre::eyre!("START_AMOUNT {raw:?} out of range: {e}"))
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
