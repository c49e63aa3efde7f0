//! Reserve-update application and per-cycle pricing (component C4): the
//! exclusive write-then-evaluate critical section and the constant-product
//! arithmetic it drives.

mod evaluator;
mod pricing;

pub use evaluator::Evaluator;
pub use pricing::{PricingParams, Priced, price_cycle};
