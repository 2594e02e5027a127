// polyparty-core: prediction-market pricing and settlement engine.
// demand-first architecture: the per-unit price model and atomic commit
// path take priority. all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: EventId, AccountId, Money, Price, Timestamp
//   2.x  pricing.rs: marginal price model (pure)
//   2.1  quote.rs: n-unit purchase simulation (pure)
//   3.x  ledger.rs: committed shares, derived totals, unit-of-work commits
//   4.x  engine/: core engine: quotes, purchases, settlement
//   5.x  gateway.rs: concurrent surface, optimistic commit retries
//   6.x  event.rs / share.rs / account.rs: domain entities
//   7.x  audit.rs: state-change records for audit trails

// domain entities
pub mod account;
pub mod event;
pub mod share;
pub mod types;

// pricing core
pub mod pricing;
pub mod quote;

// state and execution
pub mod audit;
pub mod engine;
pub mod gateway;
pub mod ledger;

// re exports for convenience
pub use account::*;
pub use audit::*;
pub use engine::{Engine, EngineConfig, EngineError, PurchaseResult, SettlementReport};
pub use event::*;
pub use gateway::MarketGateway;
pub use ledger::{Ledger, LedgerError, LedgerInstruction, UnitOfWork};
pub use pricing::{cold_start_price, marginal_price};
pub use quote::{simulate_purchase, PriceQuote};
pub use share::Share;
pub use types::*;
