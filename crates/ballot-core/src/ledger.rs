// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - BALANCE LEDGER
//
// Identifier → balance mapping plus the total supply.
// Invariant: sum(balances) == total_supply after every call.
// Moves are two-step (prepare, then commit) so callers can validate every
// precondition of a compound operation before anything is written.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceLedger {
    /// BTreeMap for deterministic serialization and state hashing
    #[serde(with = "crate::serde_u128::map")]
    balances: BTreeMap<String, u128>,
    #[serde(with = "crate::serde_u128")]
    total_supply: u128,
}

/// A validated ledger move. Holds the post-move balances so that committing
/// it cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub from: String,
    pub to: String,
    pub amount: u128,
    from_after: u128,
    to_after: u128,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &str) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Credit `amount` to `to`, growing the supply. Authorization and phase
    /// checks belong to the caller.
    pub fn mint(&mut self, to: &str, amount: u128) -> Result<()> {
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.balances.insert(to.to_string(), balance);
        self.total_supply = supply;
        Ok(())
    }

    /// All-or-nothing batch credit. The whole batch is computed against a
    /// scratch copy of the touched balances; nothing is written unless every
    /// entry fits.
    pub fn mint_batch(&mut self, accounts: &[String], amounts: &[u128]) -> Result<()> {
        if accounts.len() != amounts.len() {
            return Err(LedgerError::ArityMismatch {
                accounts: accounts.len(),
                amounts: amounts.len(),
            });
        }

        let mut staged: BTreeMap<&str, u128> = BTreeMap::new();
        let mut supply = self.total_supply;
        for (account, amount) in accounts.iter().zip(amounts) {
            let current = match staged.get(account.as_str()) {
                Some(v) => *v,
                None => self.balance_of(account),
            };
            let next = current
                .checked_add(*amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            staged.insert(account.as_str(), next);
            supply = supply
                .checked_add(*amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }

        for (account, balance) in staged {
            self.balances.insert(account.to_string(), balance);
        }
        self.total_supply = supply;
        Ok(())
    }

    /// Validate a move without touching state.
    pub fn prepare_move(&self, from: &str, to: &str, amount: u128) -> Result<PendingMove> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.to_string(),
                have: from_balance,
                need: amount,
            });
        }

        let (from_after, to_after) = if from == to {
            (from_balance, from_balance)
        } else {
            let to_after = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            (from_balance - amount, to_after)
        };

        Ok(PendingMove {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            from_after,
            to_after,
        })
    }

    pub fn commit_move(&mut self, pending: PendingMove) {
        if pending.amount == 0 {
            return;
        }
        self.balances.insert(pending.from, pending.from_after);
        self.balances.insert(pending.to, pending.to_after);
    }

    /// Plain `from → to` move. `amount = 0` is a legal no-op.
    pub fn move_balance(&mut self, from: &str, to: &str, amount: u128) -> Result<()> {
        let pending = self.prepare_move(from, to, amount)?;
        self.commit_move(pending);
        Ok(())
    }

    /// Iterate `(account, balance)` in key order.
    pub fn holders(&self) -> impl Iterator<Item = (&str, u128)> {
        self.balances.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Recomputed sum of every balance; `None` on overflow, which would mean
    /// the supply invariant is already broken.
    pub fn sum_of_balances(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
    }
}
