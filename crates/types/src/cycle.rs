use alloy_primitives::Address;

/// One hop of a `Cycle`. `target` is the token produced by this hop; `lp` is
/// the pool the hop swaps through. The invariant `target ∈ {pool(lp).token1,
/// pool(lp).token2}` is declared by the data model but is not validated by
/// the catalog loader — it only checks malformed JSON, address-regex
/// mismatches, and references to an unknown pool (§4.1). A route violating
/// this invariant loads successfully: `price_cycle` only ever tests
/// `target == pool.token1`, so any `target` other than `token1` (including
/// one equal to neither token) is treated as the `token2`-as-output case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteStep {
    pub target: Address,
    pub lp:     Address
}

/// A base-currency-to-base-currency route through `steps.len()` pools,
/// `steps.len() ∈ [2, 5]`. The engine does not verify that the route actually
/// starts and ends at WETH — a malformed cycle just prices to whatever its
/// steps compute, which in practice means no profit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub id:    i64,
    pub steps: Vec<RouteStep>
}

impl Cycle {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn path_id(&self) -> String {
        self.id.to_string()
    }

    /// Every pool address this cycle touches, in step order (may repeat a
    /// pool if the route revisits it).
    pub fn pools(&self) -> impl Iterator<Item = Address> + '_ {
        self.steps.iter().map(|s| s.lp)
    }
}
