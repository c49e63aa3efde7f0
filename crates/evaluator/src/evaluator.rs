use std::sync::Arc;

use alloy_primitives::{Address, U256};
use arb_store::Store;
use arb_subscriber::RateDispatcher;
use arb_types::{FatalError, RateUpdate, Token};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, warn};

use crate::pricing::{PricingParams, price_cycle};

/// Component C4. Holds the pricing constants and the two channels its
/// output fans out through: the `RateUpdate` broadcast to the Broadcaster,
/// and a side channel for escalating a poisoned Store lock to the
/// Supervisor (the one failure `updateAndEvaluate` cannot just absorb).
pub struct Evaluator {
    store:  Arc<Store>,
    params: PricingParams,
    base_symbol: String,
    updates: broadcast::Sender<RateUpdate>,
    fatal:  mpsc::UnboundedSender<FatalError>
}

impl Evaluator {
    pub fn new(
        store: Arc<Store>,
        params: PricingParams,
        base_symbol: String,
        updates: broadcast::Sender<RateUpdate>,
        fatal: mpsc::UnboundedSender<FatalError>
    ) -> Self {
        Self { store, params, base_symbol, updates, fatal }
    }

    /// Subscribes a new observer to every `RateUpdate` this evaluator
    /// emits, for the Broadcaster to forward.
    pub fn subscribe(&self) -> broadcast::Receiver<RateUpdate> {
        self.updates.subscribe()
    }

    /// Writes `{reserve1 <- r0, reserve2 <- r1}` for `pool_addr` and prices
    /// every cycle touching it, all under one acquisition of the Store's
    /// exclusive reserve lock. An unknown pool is a silent noop. A poisoned
    /// lock is escalated on the fatal channel rather than panicking here.
    pub fn update_and_evaluate(&self, pool_addr: Address, r0: U256, r1: U256) {
        let mut guard = match self.store.lock_pools() {
            Ok(guard) => guard,
            Err(fatal) => {
                error!(error = %fatal, "store lock poisoned during evaluation");
                let _ = self.fatal.send(fatal);
                return;
            }
        };

        if let Some(pool) = guard.get_mut(&pool_addr) {
            pool.set_reserves(r0, r1);
        } else {
            return;
        }

        for cycle_id in self.store.cycles_touching(&pool_addr) {
            let Some(cycle) = self.store.cycle(cycle_id) else { continue };
            let tokens_lookup = |addr: Address| -> Token {
                self.store.token(&addr).unwrap_or_else(|| Token::unknown(addr))
            };

            match price_cycle(&guard, tokens_lookup, &cycle, &self.base_symbol, self.params) {
                Ok(priced) => {
                    let update = RateUpdate {
                        path_id:          cycle.path_id(),
                        path_description: priced.path_description,
                        rate:             priced.rate
                    };
                    // No active observers is the common case before the
                    // Broadcaster's first subscription; not an error.
                    let _ = self.updates.send(update);
                }
                Err(reason) => {
                    warn!(cycle_id, %reason, "cycle references an unknown pool, skipping");
                }
            }
        }
    }
}

impl RateDispatcher for Evaluator {
    fn dispatch(&self, pool: Address, reserve0: U256, reserve1: U256) {
        self.update_and_evaluate(pool, reserve0, reserve1);
    }
}
