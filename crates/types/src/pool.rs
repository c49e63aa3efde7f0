use alloy_primitives::{Address, U256};

/// A Uniswap-V2-shaped constant-product pool. `token1`/`token2` and `address`
/// are immutable after catalog load; `reserve1`/`reserve2` are the only
/// mutable state in the whole Store, written exclusively by the Evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub address:  Address,
    pub token1:   Address,
    pub token2:   Address,
    pub reserve1: U256,
    pub reserve2: U256
}

impl Pool {
    pub fn new(address: Address, token1: Address, token2: Address) -> Self {
        Self { address, token1, token2, reserve1: U256::ZERO, reserve2: U256::ZERO }
    }

    /// Overwrites both reserves, as happens on every `Sync` event.
    pub fn set_reserves(&mut self, reserve1: U256, reserve2: U256) {
        self.reserve1 = reserve1;
        self.reserve2 = reserve2;
    }

    /// A hop through a pool with either reserve at zero always produces zero
    /// output, per the data model's invariant.
    pub fn is_drained(&self) -> bool {
        self.reserve1.is_zero() || self.reserve2.is_zero()
    }
}
