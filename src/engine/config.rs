//! Engine configuration options.

use crate::types::Money;
use rust_decimal_macros::dec;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of audit records to retain in memory.
    pub max_audit_records: usize,
    /// Commit attempts before a purchase gives up with a conflict error.
    pub max_commit_retries: u32,
    /// Starting balance applied by `create_funded_account`.
    pub default_funding: Money,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_audit_records: 100_000,
            max_commit_retries: 3,
            default_funding: Money::new(dec!(100)),
        }
    }
}
