// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - DISTRIBUTION POOL ACCESSOR
//
// The reward reserve is a balance held by the campaign contract itself,
// either of a separate asset (e.g. a reward token) or of native value sent
// straight to the contract address. The asset's own ledger is external and
// only reached through `AssetLedger`.
//
// The high-water mark is the largest pool balance ever observed. Payouts are
// anchored on it so withdrawals made mid-campaign do not shrink anyone's
// entitlement.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Asset id under which native value is tracked by the host.
pub const NATIVE_ASSET: &str = "native";

/// Transfer-in/transfer-out view of an external multi-asset ledger.
pub trait AssetLedger {
    fn balance_of(&self, asset: &str, holder: &str) -> u128;

    /// Move `amount` of `asset` from `from` to `to`. Zero-value transfers
    /// must succeed.
    fn transfer(
        &mut self,
        asset: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> std::result::Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolSource {
    Asset { asset_id: String },
    Native,
}

impl PoolSource {
    pub fn asset(&self) -> &str {
        match self {
            PoolSource::Asset { asset_id } => asset_id,
            PoolSource::Native => NATIVE_ASSET,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            PoolSource::Asset { asset_id } if asset_id.is_empty() => {
                Err("pool asset_id must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPool {
    source: PoolSource,
    /// Address holding the pool (the campaign contract)
    holder: String,
    #[serde(with = "crate::serde_u128")]
    high_water_mark: u128,
}

impl DistributionPool {
    pub fn new(source: PoolSource, holder: String) -> Self {
        Self {
            source,
            holder,
            high_water_mark: 0,
        }
    }

    pub fn source(&self) -> &PoolSource {
        &self.source
    }

    pub fn asset(&self) -> &str {
        self.source.asset()
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn high_water_mark(&self) -> u128 {
        self.high_water_mark
    }

    pub fn balance(&self, bank: &dyn AssetLedger) -> u128 {
        bank.balance_of(self.asset(), &self.holder)
    }

    /// High-water mark as it would be after observing the current balance.
    pub fn anchor(&self, bank: &dyn AssetLedger) -> u128 {
        self.high_water_mark.max(self.balance(bank))
    }

    /// Fold an observed balance into the high-water mark.
    pub fn observe(&mut self, balance: u128) {
        if balance > self.high_water_mark {
            self.high_water_mark = balance;
        }
    }

    /// Pay `amount` from the pool to `to`.
    pub fn disburse(&self, bank: &mut dyn AssetLedger, to: &str, amount: u128) -> Result<()> {
        let have = self.balance(bank);
        if have < amount {
            return Err(LedgerError::InsufficientPool { have, need: amount });
        }
        bank.transfer(self.asset(), &self.holder, to, amount)
            .map_err(LedgerError::AssetTransfer)
    }

    /// Move the holder's entire balance of `asset` to `to`. An empty balance
    /// is a zero-value transfer, not an error.
    pub fn drain(&self, bank: &mut dyn AssetLedger, asset: &str, to: &str) -> Result<u128> {
        let amount = bank.balance_of(asset, &self.holder);
        bank.transfer(asset, &self.holder, to, amount)
            .map_err(LedgerError::AssetTransfer)?;
        Ok(amount)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Minimal bank for unit tests. The VM crate has the real one.
    #[derive(Default)]
    pub(crate) struct MockBank {
        pub balances: BTreeMap<(String, String), u128>,
        pub refuse: bool,
        /// Assets whose transfers always fail
        pub frozen: Vec<String>,
        /// Holder that cannot receive anything
        pub refuse_credit_to: Option<String>,
    }

    impl MockBank {
        pub fn credit(&mut self, asset: &str, holder: &str, amount: u128) {
            *self
                .balances
                .entry((asset.to_string(), holder.to_string()))
                .or_insert(0) += amount;
        }
    }

    impl AssetLedger for MockBank {
        fn balance_of(&self, asset: &str, holder: &str) -> u128 {
            self.balances
                .get(&(asset.to_string(), holder.to_string()))
                .copied()
                .unwrap_or(0)
        }

        fn transfer(
            &mut self,
            asset: &str,
            from: &str,
            to: &str,
            amount: u128,
        ) -> std::result::Result<(), String> {
            if self.refuse {
                return Err("bank offline".to_string());
            }
            if self.frozen.iter().any(|a| a == asset) {
                return Err(format!("{} is frozen", asset));
            }
            if self.refuse_credit_to.as_deref() == Some(to) {
                return Err(format!("{} cannot receive", to));
            }
            let have = self.balance_of(asset, from);
            if have < amount {
                return Err("insufficient".to_string());
            }
            self.balances
                .insert((asset.to_string(), from.to_string()), have - amount);
            self.credit(asset, to, amount);
            Ok(())
        }
    }

    const CONTRACT: &str = "BALCon00000000000000000000000000000000";
    const OWNER: &str = "BALWowner00000000000000000000000000000";

    fn pool() -> DistributionPool {
        DistributionPool::new(
            PoolSource::Asset {
                asset_id: "CHSB".to_string(),
            },
            CONTRACT.to_string(),
        )
    }

    #[test]
    fn test_native_asset_id() {
        assert_eq!(PoolSource::Native.asset(), NATIVE_ASSET);
    }

    #[test]
    fn test_observe_only_raises() {
        let mut p = pool();
        p.observe(100);
        p.observe(40);
        assert_eq!(p.high_water_mark(), 100);
    }

    #[test]
    fn test_anchor_uses_current_balance() {
        let mut bank = MockBank::default();
        let mut p = pool();
        p.observe(10);
        bank.credit("CHSB", CONTRACT, 25);
        assert_eq!(p.anchor(&bank), 25);
        assert_eq!(p.high_water_mark(), 10);
    }

    #[test]
    fn test_disburse_checks_pool() {
        let mut bank = MockBank::default();
        bank.credit("CHSB", CONTRACT, 5);
        let p = pool();
        assert_eq!(
            p.disburse(&mut bank, OWNER, 6),
            Err(LedgerError::InsufficientPool { have: 5, need: 6 })
        );
        p.disburse(&mut bank, OWNER, 5).unwrap();
        assert_eq!(bank.balance_of("CHSB", OWNER), 5);
    }

    #[test]
    fn test_drain_twice_is_zero() {
        let mut bank = MockBank::default();
        bank.credit("CHSB", CONTRACT, 77);
        let p = pool();
        assert_eq!(p.drain(&mut bank, "CHSB", OWNER).unwrap(), 77);
        assert_eq!(p.drain(&mut bank, "CHSB", OWNER).unwrap(), 0);
        assert_eq!(bank.balance_of("CHSB", OWNER), 77);
    }

    #[test]
    fn test_bank_refusal_maps_to_asset_transfer() {
        let mut bank = MockBank::default();
        bank.credit("CHSB", CONTRACT, 5);
        bank.refuse = true;
        let err = pool().disburse(&mut bank, OWNER, 1).unwrap_err();
        assert_eq!(err.kind(), "asset_transfer");
    }
}
