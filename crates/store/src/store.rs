use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard}
};

use alloy_primitives::Address;
use arb_types::{CatalogError, Cycle, FatalError, Pool, Token};

use crate::catalog::load_catalog;

/// The process-wide arbitrage catalog: the immutable token/cycle/topology
/// indexes built once at startup, plus the one piece of mutable state in the
/// whole engine — every pool's reserves — behind a single `Mutex`.
///
/// Reserve writes (Hydrator, Subscriber) and cycle evaluation (Evaluator) all
/// acquire this same lock, so a cycle is never priced against a mix of
/// pre- and post-update reserves.
pub struct Store {
    tokens:         HashMap<Address, Token>,
    cycles:         HashMap<i64, Cycle>,
    pool_to_cycles: HashMap<Address, Vec<i64>>,
    all_pools:      Vec<Address>,
    pools:          Mutex<HashMap<Address, Pool>>
}

impl Store {
    /// Reads the catalog database, validates it, and builds every index.
    /// The catalog connection is closed before this returns.
    pub async fn load(db_name: &str) -> Result<Self, CatalogError> {
        let catalog = load_catalog(db_name).await?;

        let all_pools: Vec<Address> = catalog.pools.keys().copied().collect();

        let mut pool_to_cycles: HashMap<Address, Vec<i64>> = HashMap::new();
        for cycle in catalog.cycles.values() {
            for pool_addr in cycle.pools() {
                let touching = pool_to_cycles.entry(pool_addr).or_default();
                if !touching.contains(&cycle.id) {
                    touching.push(cycle.id);
                }
            }
        }

        Ok(Self {
            tokens: catalog.tokens,
            cycles: catalog.cycles,
            pool_to_cycles,
            all_pools,
            pools: Mutex::new(catalog.pools)
        })
    }

    pub fn token(&self, address: &Address) -> Option<Token> {
        self.tokens.get(address).cloned()
    }

    pub fn cycle(&self, id: i64) -> Option<Cycle> {
        self.cycles.get(&id).cloned()
    }

    /// Every cycle id this pool participates in, in the order discovered
    /// while loading the catalog.
    pub fn cycles_touching(&self, pool: &Address) -> Vec<i64> {
        self.pool_to_cycles.get(pool).cloned().unwrap_or_default()
    }

    /// Every pool address known to the catalog, for the Hydrator and
    /// Subscriber to batch over. This set never changes after `load()`.
    pub fn pools(&self) -> &[Address] {
        &self.all_pools
    }

    /// A point-in-time clone of one pool's reserves.
    pub fn pool(&self, address: &Address) -> Result<Option<Pool>, FatalError> {
        let guard = self.lock_pools()?;
        Ok(guard.get(address).cloned())
    }

    /// Acquires the single process-wide reserve lock. Held across an entire
    /// write-then-evaluate critical section by callers in `arb-evaluator`, so
    /// cycle pricing always sees a self-consistent snapshot of every pool.
    pub fn lock_pools(&self) -> Result<MutexGuard<'_, HashMap<Address, Pool>>, FatalError> {
        self.pools.lock().map_err(|_| FatalError::LockPoisoned)
    }
}
