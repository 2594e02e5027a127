// 4.0: the core engine. coordinates quoting, purchase execution, and
// settlement over the entity maps and the ledger. deterministic, synchronous,
// no external I/O; concurrency lives one layer up in the gateway.

mod config;
mod core;
mod purchases;
mod quotes;
mod results;
mod settlement;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{EngineError, PurchaseResult, SettlementReport};

pub(crate) use results::CommitError;
