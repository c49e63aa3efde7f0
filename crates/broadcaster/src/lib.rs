//! Push fan-out server (component C5). Every connected observer gets its
//! own forwarding task; a slow or disconnected observer is dropped without
//! affecting anyone else.

mod api;

use arb_metrics::EngineMetricsWrapper;
use arb_types::{ArbitrageRateUpdatedMessage, FatalError, RateUpdate};
use futures_util::StreamExt;
use jsonrpsee::{
    PendingSubscriptionSink, SubscriptionMessage,
    server::{ServerBuilder, ServerHandle}
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

pub use api::RateApiServer;

struct RateApiImpl {
    updates: broadcast::Sender<RateUpdate>
}

#[jsonrpsee::core::async_trait]
impl api::RateApiServer for RateApiImpl {
    async fn subscribe_rate_updates(
        &self,
        pending: PendingSubscriptionSink
    ) -> jsonrpsee::core::SubscriptionResult {
        let sink = pending.accept().await?;
        let mut updates = BroadcastStream::new(self.updates.subscribe());
        let metrics = EngineMetricsWrapper::new();
        metrics.observer_connected();

        tokio::spawn(async move {
            while let Some(received) = updates.next().await {
                if sink.is_closed() {
                    break;
                }

                let update = match received {
                    Ok(update) => update,
                    // A lagged receiver means this observer missed events
                    // under load; keep forwarding rather than disconnect.
                    Err(_) => continue
                };

                let message: ArbitrageRateUpdatedMessage = update.into();
                match SubscriptionMessage::from_json(&message) {
                    Ok(message) => {
                        if sink.send(message).await.is_err() {
                            debug!("observer send failed, dropping subscription");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to serialize rate update, dropping subscription");
                        break;
                    }
                }
            }
            metrics.observer_disconnected();
        });

        Ok(())
    }
}

/// The running push server. `close()` stops accepting new connections and
/// closes every existing one.
pub struct Broadcaster {
    handle: ServerHandle
}

impl Broadcaster {
    /// Binds to `port` and starts serving `subscribeRateUpdates`. Every
    /// `RateUpdate` ever sent on `updates` reaches every subscriber
    /// connected at the time it is sent.
    pub async fn bind(port: u16, updates: broadcast::Sender<RateUpdate>) -> Result<Self, FatalError> {
        let server = ServerBuilder::default()
            .build(format!("0.0.0.0:{port}"))
            .await
            .map_err(|e| FatalError::PortBindFailure(port, e.to_string()))?;

        let addr = server.local_addr().map_err(|e| FatalError::PortBindFailure(port, e.to_string()))?;
        let rpc_module = RateApiImpl { updates }.into_rpc();
        let handle = server.start(rpc_module);

        info!(%addr, "broadcaster listening");
        Ok(Self { handle })
    }

    /// Stops accepting new connections and closes every existing one.
    /// Idempotent.
    pub fn close(&self) {
        let _ = self.handle.stop();
    }

    /// Resolves once the server has fully shut down, for the Supervisor to
    /// await during its drain sequence.
    pub async fn stopped(&self) {
        self.handle.clone().stopped().await;
    }
}
