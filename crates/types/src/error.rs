use alloy_primitives::Address;
use thiserror::Error;

use crate::address::InvalidAddress;

/// Fatal at startup: a malformed catalog or a reference to a pool that does
/// not exist. The catalog connection is never left open after this returns.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog database: {0}")]
    Connection(String),
    #[error("malformed catalog row in {table}: {reason}")]
    MalformedRow { table: &'static str, reason: String },
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
    #[error("failed to parse route path for route {route_id}: {reason}")]
    MalformedPath { route_id: i64, reason: String },
    #[error("route {route_id} references unknown pool {pool}")]
    UnknownPool { route_id: i64, pool: Address },
    #[error("token decimals {decimals} out of range [0, 30] for token {token}")]
    DecimalsOutOfRange { token: Address, decimals: u32 }
}

/// Local to one hydration batch: logged and skipped, never aborts hydration.
#[derive(Debug, Error)]
#[error("hydration batch failed for {pool_count} pools: {reason}")]
pub struct HydrationBatchError {
    pub pool_count: usize,
    pub reason:     String
}

/// Local to one streaming connection: triggers a scheduled reconnect for the
/// owning batch, leaves every other batch untouched.
#[derive(Debug, Error)]
#[error("subscription error on batch {batch_index}: {reason}")]
pub struct SubscriptionError {
    pub batch_index: usize,
    pub reason:      String
}

/// Local to one log: logged and skipped.
#[derive(Debug, Error)]
#[error("failed to decode Sync log from {address}: {reason}")]
pub struct DecodeError {
    pub address: Address,
    pub reason:  String
}

/// Arithmetic degeneracies inside the pricing algorithm. These never
/// propagate as `Err` — they are absorbed as an output of zero — but are
/// represented as a type so tests can assert on exactly which degeneracy
/// fired.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("hop reserve is zero")]
    ZeroReserve,
    #[error("swap denominator is zero")]
    ZeroDenominator,
    #[error("cycle references unknown pool {0}")]
    UnknownPool(Address)
}

/// Local to one observer connection: logged, that observer is dropped, fan
/// out continues for everyone else.
#[derive(Debug, Error)]
#[error("failed to deliver update to observer: {0}")]
pub struct BroadcastError(pub String);

/// Escalates to the Supervisor, which logs it and exits with status 1.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("store lock was poisoned")]
    LockPoisoned,
    #[error("failed to bind broadcaster to port {0}: {1}")]
    PortBindFailure(u16, String),
    #[error("evaluator event channel closed unexpectedly")]
    ChannelClosed
}
