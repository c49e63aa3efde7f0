//! One-shot batched reserve hydration (component C2). Reads every known
//! pool's current reserves from the on-chain aggregator contract before the
//! Subscriber opens a single streaming connection.

use std::future::Future;

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol,
    sol_types::SolCall
};
use alloy_primitives::{Address, U256};
use arb_metrics::EngineMetricsWrapper;
use arb_store::Store;
use arb_types::{FatalError, HydrationBatchError};
use tracing::{info, warn};

/// The ABI-encoding of `uint112` and `uint256` are identical (both pad to a
/// 32-byte word); decoding the aggregator's `uint112[]` return as `uint256[]`
/// loses nothing and avoids threading a narrow integer width through the
/// rest of the pipeline.
sol! {
    interface IUniswapViewer {
        function viewPair(address[] calldata pairs) external view returns (uint256[] memory reserves);
    }
}

/// Abstracts the aggregator call so `Hydrator`'s batching and fault-tolerance
/// logic can be exercised without a live provider.
pub trait ReserveAggregator {
    fn view_pair(&self, pairs: &[Address]) -> impl Future<Output = Result<Vec<U256>, String>> + Send;
}

/// Calls `viewPair` on `viewer` over an HTTPS JSON-RPC provider.
pub struct AlloyAggregator<P> {
    provider: P,
    viewer:   Address
}

impl<P: Provider> AlloyAggregator<P> {
    pub fn new(provider: P, viewer: Address) -> Self {
        Self { provider, viewer }
    }
}

impl AlloyAggregator<alloy::providers::RootProvider> {
    /// Builds an aggregator against `rpc_url` over plain HTTPS, per §6 — the
    /// Hydrator never uses the streaming endpoint.
    pub fn connect_http(rpc_url: url::Url, viewer: Address) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.into());
        Self { provider, viewer }
    }
}

impl<P: Provider + Sync> ReserveAggregator for AlloyAggregator<P> {
    async fn view_pair(&self, pairs: &[Address]) -> Result<Vec<U256>, String> {
        let calldata = IUniswapViewer::viewPairCall { pairs: pairs.to_vec() }.abi_encode();
        let tx = TransactionRequest::default().to(self.viewer).input(calldata.into());

        let raw = self.provider.call(tx).await.map_err(|e| e.to_string())?;
        let decoded = IUniswapViewer::viewPairCall::abi_decode_returns(&raw).map_err(|e| e.to_string())?;
        Ok(decoded.reserves)
    }
}

/// Hydrates every pool in `store` exactly once, `batch_size` addresses at a
/// time. A failed batch is logged and skipped; its pools keep reserves of
/// `0`. Hydration never aborts and never returns an error — it is only
/// fallible in the `FatalError` sense if the Store lock itself is poisoned.
pub async fn hydrate<A: ReserveAggregator>(
    store: &Store,
    aggregator: &A,
    batch_size: usize
) -> Result<(), FatalError> {
    let pools = store.pools();
    let mut hydrated = 0usize;
    let mut failed_batches = 0usize;
    let metrics = EngineMetricsWrapper::new();

    for batch in pools.chunks(batch_size.max(1)) {
        match aggregator.view_pair(batch).await {
            Ok(reserves) if reserves.len() == 2 * batch.len() => {
                let mut guard = store.lock_pools()?;
                for (i, addr) in batch.iter().enumerate() {
                    if let Some(pool) = guard.get_mut(addr) {
                        pool.set_reserves(reserves[2 * i], reserves[2 * i + 1]);
                    }
                }
                drop(guard);
                hydrated += batch.len();
                metrics.pools_hydrated(batch.len() as u64);
            }
            Ok(reserves) => {
                failed_batches += 1;
                metrics.hydration_batch_failed();
                let err = HydrationBatchError {
                    pool_count: batch.len(),
                    reason:     format!(
                        "aggregator returned {} values for {} pools",
                        reserves.len(),
                        batch.len()
                    )
                };
                warn!(error = %err, "hydration batch returned a malformed reserve count, skipping");
            }
            Err(reason) => {
                failed_batches += 1;
                metrics.hydration_batch_failed();
                let err = HydrationBatchError { pool_count: batch.len(), reason };
                warn!(error = %err, "hydration batch failed, skipping");
            }
        }
    }

    info!(hydrated, failed_batches, total = pools.len(), "hydration complete");
    Ok(())
}
