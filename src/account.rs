//! Account balances.
//!
//! An account is only ever debited by the transaction executor and credited
//! by deposits or settlement payouts. A debit can never push the balance
//! negative; that check is the last line of defense under the ledger's own
//! pre-commit validation.

use crate::types::{AccountId, Money, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Money,
    pub total_deposited: Money,
    pub created_at: Timestamp,
}

impl Account {
    pub fn new(id: AccountId, timestamp: Timestamp) -> Self {
        Self {
            id,
            balance: Money::zero(),
            total_deposited: Money::zero(),
            created_at: timestamp,
        }
    }

    pub fn deposit(&mut self, amount: Money) {
        self.balance = self.balance.add(amount);
        self.total_deposited = self.total_deposited.add(amount);
    }

    /// Credit from a settlement payout.
    pub fn credit(&mut self, amount: Money) {
        self.balance = self.balance.add(amount);
    }

    pub fn debit(&mut self, amount: Money) -> Result<(), AccountError> {
        if amount > self.balance {
            return Err(AccountError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance = self.balance.sub(amount);
        Ok(())
    }

    pub fn can_cover(&self, amount: Money) -> bool {
        self.balance >= amount
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Money, available: Money },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_account() -> Account {
        let mut account = Account::new(AccountId::new("acct-1"), Timestamp::from_millis(0));
        account.deposit(Money::new(dec!(100)));
        account
    }

    #[test]
    fn deposit_and_debit() {
        let mut account = test_account();
        assert_eq!(account.balance.value(), dec!(100));

        account.debit(Money::new(dec!(2.48))).unwrap();
        assert_eq!(account.balance.value(), dec!(97.52));
        assert_eq!(account.total_deposited.value(), dec!(100));
    }

    #[test]
    fn debit_never_goes_negative() {
        let mut account = test_account();
        let result = account.debit(Money::new(dec!(100.01)));
        assert!(matches!(
            result,
            Err(AccountError::InsufficientBalance { .. })
        ));
        assert_eq!(account.balance.value(), dec!(100));
    }

    #[test]
    fn credit_from_payout() {
        let mut account = test_account();
        account.credit(Money::new(dec!(3)));
        assert_eq!(account.balance.value(), dec!(103));
        // payouts are not deposits
        assert_eq!(account.total_deposited.value(), dec!(100));
    }

    #[test]
    fn can_cover_is_inclusive() {
        let account = test_account();
        assert!(account.can_cover(Money::new(dec!(100))));
        assert!(!account.can_cover(Money::new(dec!(100.01))));
    }
}
