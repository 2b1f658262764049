// SPDX-License-Identifier: AGPL-3.0-only
//! # Asset Bank
//!
//! Host-side multi-asset balances: native value plus any number of external
//! tokens (e.g. the reward token a campaign pays out in). Campaign contracts
//! see it only through [`AssetLedger`].

use ballot_core::{AssetLedger, NATIVE_ASSET};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bank {
    /// asset → holder → balance
    /// BTreeMap for deterministic serialization
    #[serde(with = "ballot_core::serde_u128::nested_map")]
    assets: BTreeMap<String, BTreeMap<String, u128>>,
    /// asset → total issued
    #[serde(with = "ballot_core::serde_u128::map")]
    issued: BTreeMap<String, u128>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` out of thin air for `holder`. Host-only:
    /// genesis allocations, faucets, tests.
    pub fn issue(&mut self, asset: &str, holder: &str, amount: u128) -> Result<(), String> {
        let supply = self.issued.get(asset).copied().unwrap_or(0);
        let supply = supply
            .checked_add(amount)
            .ok_or_else(|| format!("{} supply overflow", asset))?;
        let bal = self
            .assets
            .entry(asset.to_string())
            .or_default()
            .entry(holder.to_string())
            .or_insert(0);
        *bal = bal
            .checked_add(amount)
            .ok_or_else(|| format!("{} balance overflow", asset))?;
        self.issued.insert(asset.to_string(), supply);
        Ok(())
    }

    pub fn issued(&self, asset: &str) -> u128 {
        self.issued.get(asset).copied().unwrap_or(0)
    }

    pub fn native_balance(&self, holder: &str) -> u128 {
        self.balance_of(NATIVE_ASSET, holder)
    }

    /// Every asset `holder` has a non-zero balance of.
    pub fn holdings(&self, holder: &str) -> BTreeMap<String, u128> {
        self.assets
            .iter()
            .filter_map(|(asset, holders)| {
                holders
                    .get(holder)
                    .filter(|b| **b > 0)
                    .map(|b| (asset.clone(), *b))
            })
            .collect()
    }
}

impl AssetLedger for Bank {
    fn balance_of(&self, asset: &str, holder: &str) -> u128 {
        self.assets
            .get(asset)
            .and_then(|h| h.get(holder))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, asset: &str, from: &str, to: &str, amount: u128) -> Result<(), String> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let from_balance = self.balance_of(asset, from);
        if from_balance < amount {
            return Err(format!(
                "Insufficient {}: {} has {} need {}",
                asset, from, from_balance, amount
            ));
        }
        let to_balance = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| format!("{} balance overflow", asset))?;

        let holders = self.assets.entry(asset.to_string()).or_default();
        holders.insert(from.to_string(), from_balance - amount);
        holders.insert(to.to_string(), to_balance);
        Ok(())
    }
}

/// Prior value of one balance cell, recorded before a journaled write.
#[derive(Debug, Clone)]
struct Undo {
    asset: String,
    holder: String,
    previous: Option<u128>,
    asset_existed: bool,
}

/// Write-ahead view of a [`Bank`] for one call. Records the prior value of
/// every cell it touches so a failed call can be undone in O(touched cells).
pub struct JournaledBank<'a> {
    bank: &'a mut Bank,
    undo: Vec<Undo>,
}

impl<'a> JournaledBank<'a> {
    pub fn new(bank: &'a mut Bank) -> Self {
        Self {
            bank,
            undo: Vec::new(),
        }
    }

    fn record(&mut self, asset: &str, holder: &str) {
        let holders = self.bank.assets.get(asset);
        self.undo.push(Undo {
            asset: asset.to_string(),
            holder: holder.to_string(),
            previous: holders.and_then(|h| h.get(holder)).copied(),
            asset_existed: holders.is_some(),
        });
    }

    /// Number of cells that would be restored on rollback.
    pub fn touched(&self) -> usize {
        self.undo.len()
    }

    /// Keep every write.
    pub fn commit(self) {}

    /// Restore every touched cell, newest first.
    pub fn rollback(self) {
        for u in self.undo.into_iter().rev() {
            let holders = self.bank.assets.entry(u.asset.clone()).or_default();
            match u.previous {
                Some(bal) => {
                    holders.insert(u.holder, bal);
                }
                None => {
                    holders.remove(&u.holder);
                }
            }
            if !u.asset_existed && holders.is_empty() {
                self.bank.assets.remove(&u.asset);
            }
        }
    }
}

impl AssetLedger for JournaledBank<'_> {
    fn balance_of(&self, asset: &str, holder: &str) -> u128 {
        self.bank.balance_of(asset, holder)
    }

    fn transfer(&mut self, asset: &str, from: &str, to: &str, amount: u128) -> Result<(), String> {
        if amount == 0 || from == to {
            return Ok(());
        }
        self.record(asset, from);
        self.record(asset, to);
        self.bank.transfer(asset, from, to, amount)
    }
}
