//! Value custody
//!
//! The ledger never touches balances directly. Funds attached to a call are
//! taken with [`Custody::debit`] and released with [`Custody::credit`]; both
//! may fail, and the ledger treats each as an atomic sub-operation.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::CustodyError;
use crate::types::{AccountId, Amount};

pub trait Custody: Send {
    /// Move `amount` from `from` into the ledger's custody.
    fn debit(&mut self, from: &AccountId, amount: Amount) -> Result<(), CustodyError>;

    /// Move `amount` out of the ledger's custody to `to`.
    fn credit(&mut self, to: &AccountId, amount: Amount) -> Result<(), CustodyError>;
}

/// Balance sheet kept in memory, with a single pool for escrowed value.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustody {
    balances: HashMap<AccountId, Amount>,
    held: Amount,
    frozen: HashSet<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account: AccountId,
    pub balance: Amount,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances<I, A>(balances: I) -> Self
    where
        I: IntoIterator<Item = (A, Amount)>,
        A: Into<AccountId>,
    {
        let mut custody = Self::new();
        for (account, amount) in balances {
            custody.deposit(account, amount);
        }
        custody
    }

    /// Add external funds to an account.
    pub fn deposit(&mut self, account: impl Into<AccountId>, amount: Amount) {
        let balance = self.balances.entry(account.into()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Total currently held on the ledger's behalf.
    pub fn held(&self) -> Amount {
        self.held
    }

    /// Frozen accounts reject credits until thawed.
    pub fn freeze(&mut self, account: impl Into<AccountId>) {
        self.frozen.insert(account.into());
    }

    pub fn thaw(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    pub fn balances(&self) -> Vec<AccountBalance> {
        let mut balances: Vec<_> = self
            .balances
            .iter()
            .map(|(account, balance)| AccountBalance {
                account: account.clone(),
                balance: *balance,
            })
            .collect();
        balances.sort_by(|a, b| a.account.cmp(&b.account));
        balances
    }
}

impl Custody for InMemoryCustody {
    fn debit(&mut self, from: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        let available = self.balance(from);
        if available < amount {
            return Err(CustodyError::InsufficientFunds {
                account: from.clone(),
                available,
                required: amount,
            });
        }
        let held = self
            .held
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow(from.clone()))?;

        self.balances.insert(from.clone(), available - amount);
        self.held = held;
        debug!("Custody took {} from {}", amount, from);
        Ok(())
    }

    fn credit(&mut self, to: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        if self.frozen.contains(to) {
            return Err(CustodyError::AccountFrozen(to.clone()));
        }
        if self.held < amount {
            return Err(CustodyError::InsufficientEscrow {
                held: self.held,
                requested: amount,
            });
        }
        let balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow(to.clone()))?;

        self.balances.insert(to.clone(), balance);
        self.held -= amount;
        debug!("Custody released {} to {}", amount, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_then_credit_moves_value() {
        let mut custody = InMemoryCustody::with_balances([("alice", 100)]);
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");

        custody.debit(&alice, 60).unwrap();
        assert_eq!(custody.balance(&alice), 40);
        assert_eq!(custody.held(), 60);

        custody.credit(&bob, 60).unwrap();
        assert_eq!(custody.balance(&bob), 60);
        assert_eq!(custody.held(), 0);
    }

    #[test]
    fn test_debit_insufficient_funds_leaves_balance() {
        let mut custody = InMemoryCustody::with_balances([("alice", 10)]);
        let alice = AccountId::from("alice");

        let err = custody.debit(&alice, 11).unwrap_err();
        assert_eq!(
            err,
            CustodyError::InsufficientFunds {
                account: alice.clone(),
                available: 10,
                required: 11,
            }
        );
        assert_eq!(custody.balance(&alice), 10);
        assert_eq!(custody.held(), 0);
    }

    #[test]
    fn test_credit_cannot_exceed_held() {
        let mut custody = InMemoryCustody::new();
        let err = custody.credit(&AccountId::from("bob"), 1).unwrap_err();
        assert_eq!(
            err,
            CustodyError::InsufficientEscrow {
                held: 0,
                requested: 1
            }
        );
    }

    #[test]
    fn test_frozen_account_rejects_credit() {
        let mut custody = InMemoryCustody::with_balances([("alice", 5)]);
        let alice = AccountId::from("alice");
        custody.debit(&alice, 5).unwrap();
        custody.freeze("alice");

        assert!(matches!(
            custody.credit(&alice, 5),
            Err(CustodyError::AccountFrozen(_))
        ));
        assert_eq!(custody.held(), 5);

        custody.thaw(&alice);
        custody.credit(&alice, 5).unwrap();
        assert_eq!(custody.balance(&alice), 5);
    }

    #[test]
    fn test_balances_sorted() {
        let custody = InMemoryCustody::with_balances([("carol", 1), ("alice", 2)]);
        let names: Vec<_> = custody
            .balances()
            .into_iter()
            .map(|b| b.account.to_string())
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);
    }
}
