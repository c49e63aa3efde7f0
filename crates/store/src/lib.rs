//! The process-wide catalog and reserve state (component C1). Loads the
//! token/pool/route catalog once at startup and hands out the single lock
//! every other component synchronizes reserve reads and writes through.

mod catalog;
mod store;

pub use catalog::{LoadedCatalog, load_catalog};
pub use store::Store;
