use alloy_primitives::Address;

/// An ERC-20 token known to the Store. Immutable after catalog load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub address:  Address,
    pub symbol:   String,
    pub name:     String,
    /// Always in `[0, 30]`; the catalog loader rejects anything outside that
    /// range before a `Token` is ever constructed.
    pub decimals: u8
}

/// Placeholder rendered for a token address that the Store has never seen.
/// `decimals(in)`/`decimals(out)` in the pricing algorithm fall back to `0`
/// in this case, same as the symbol falls back to `UNKNOWN`.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

impl Token {
    pub fn unknown(address: Address) -> Self {
        Self { address, symbol: UNKNOWN_SYMBOL.to_string(), name: UNKNOWN_SYMBOL.to_string(), decimals: 0 }
    }
}
