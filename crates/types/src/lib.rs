//! Shared data model for the cycle-arbitrage engine: addresses, tokens,
//! pools, cycles, the wire event shape, and the error taxonomy every other
//! crate in the workspace builds on.

pub mod address;
pub mod cycle;
pub mod error;
pub mod event;
pub mod pool;
pub mod token;

pub use address::{InvalidAddress, parse_address, to_lower_hex};
pub use cycle::{Cycle, RouteStep};
pub use error::{
    BroadcastError, CatalogError, DecodeError, EvaluationError, FatalError, HydrationBatchError,
    SubscriptionError
};
pub use event::{ArbitrageRateUpdatedMessage, RateUpdate};
pub use pool::Pool;
pub use token::{Token, UNKNOWN_SYMBOL};

/// Base currency every cycle is denominated in.
pub const BASE_DECIMALS: u8 = 18;
