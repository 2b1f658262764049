// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - VOTING TOKEN
//
// The campaign contract: a balance ledger whose transfers into a registered
// destination (poll choice, question, alternative) pay the sender a reward
// from the distribution pool.
//
// Every write validates all of its preconditions before mutating anything,
// so a failing call leaves no trace. The only fallible external step (the
// pool-asset transfer) runs before the infallible ledger commit.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::config::{CampaignConfig, ReclaimPolicy};
use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::ledger::BalanceLedger;
use crate::lifecycle::{Lifecycle, Phase, PhaseState};
use crate::payout::RewardPolicy;
use crate::pool::{AssetLedger, DistributionPool};

/// Who is calling, and when. Supplied by the host for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext<'a> {
    pub caller: &'a str,
    /// Block timestamp in seconds
    pub timestamp: u64,
}

impl<'a> CallContext<'a> {
    pub fn new(caller: &'a str, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    /// Display scaling only
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingToken {
    pub metadata: TokenMetadata,
    /// The contract's own address; holds the pool
    contract: String,
    owner: String,
    ledger: BalanceLedger,
    lifecycle: Lifecycle,
    /// Fixed at construction
    destinations: Vec<String>,
    pool: DistributionPool,
    reward: RewardPolicy,
    reclaim: ReclaimPolicy,
}

impl VotingToken {
    /// Instantiate a campaign. `owner` is the constructing caller; `contract`
    /// is the address the host assigned to this instance.
    pub fn new(config: CampaignConfig, contract: String, owner: String) -> Result<Self> {
        config.validate().map_err(LedgerError::InvalidConfig)?;
        if contract.is_empty() || owner.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "contract and owner addresses must not be empty".to_string(),
            ));
        }
        if config.destinations.contains(&contract) {
            return Err(LedgerError::InvalidConfig(
                "the contract address cannot be a destination".to_string(),
            ));
        }

        info!(
            "Campaign {} ({}) created at {} with {} destinations",
            config.name,
            config.symbol,
            contract,
            config.destinations.len()
        );

        Ok(Self {
            metadata: TokenMetadata {
                name: config.name,
                symbol: config.symbol,
                decimals: config.decimals,
            },
            lifecycle: Lifecycle::new(&config.gating),
            pool: DistributionPool::new(config.pool, contract.clone()),
            contract,
            owner,
            ledger: BalanceLedger::new(),
            destinations: config.destinations,
            reward: config.reward,
            reclaim: config.reclaim,
        })
    }

    // ── Reads ──

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance_of(&self, account: &str) -> u128 {
        self.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn reward_policy(&self) -> &RewardPolicy {
        &self.reward
    }

    pub fn reclaim_policy(&self) -> ReclaimPolicy {
        self.reclaim
    }

    pub fn pool(&self) -> &DistributionPool {
        &self.pool
    }

    pub fn phase(&self, now: u64) -> Phase {
        self.lifecycle.phase_at(now)
    }

    pub fn phase_state(&self, now: u64) -> PhaseState {
        self.lifecycle.state(now)
    }

    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    /// Bounds-checked destination lookup.
    pub fn destination(&self, index: usize) -> Result<&str> {
        self.destinations
            .get(index)
            .map(String::as_str)
            .ok_or(LedgerError::IndexOutOfRange {
                index,
                len: self.destinations.len(),
            })
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_destination(&self, account: &str) -> bool {
        self.destinations.iter().any(|d| d == account)
    }

    /// Amount received by each destination, in configuration order. Read
    /// straight from the ledger; nothing is tallied separately.
    pub fn results(&self) -> Vec<(String, u128)> {
        self.destinations
            .iter()
            .map(|d| (d.clone(), self.ledger.balance_of(d)))
            .collect()
    }

    pub fn pool_high_water_mark(&self) -> u128 {
        self.pool.high_water_mark()
    }

    pub fn pool_balance(&self, bank: &dyn AssetLedger) -> u128 {
        self.pool.balance(bank)
    }

    /// Reward that moving `amount` to a destination would earn right now.
    /// Pure preview; does not check phase or balances.
    pub fn payout_amount(&self, bank: &dyn AssetLedger, amount: u128) -> Result<u128> {
        self.reward
            .compute(amount, self.pool.anchor(bank), self.ledger.total_supply())
    }

    /// SHA3-256 over the canonical JSON encoding, hex. Lets hosts compare
    /// replicas and verify restored snapshots.
    pub fn state_root(&self) -> Result<String> {
        let encoded =
            serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(hex::encode(Sha3_256::digest(&encoded)))
    }

    // ── Owner-gated writes ──

    fn require_owner(&self, ctx: &CallContext, operation: &str) -> Result<()> {
        if ctx.caller != self.owner {
            warn!("{} rejected: {} is not the owner", operation, ctx.caller);
            return Err(LedgerError::Unauthorized {
                caller: ctx.caller.to_string(),
            });
        }
        Ok(())
    }

    fn require_pre_open(&self, ctx: &CallContext, operation: &'static str) -> Result<Phase> {
        let phase = self.lifecycle.phase_at(ctx.timestamp);
        if phase != Phase::PreOpen {
            warn!("{} rejected: campaign is {}", operation, phase);
            return Err(LedgerError::PhaseViolation { operation, phase });
        }
        Ok(phase)
    }

    /// Owner-only, pre-open only.
    pub fn mint(&mut self, ctx: &CallContext, to: &str, amount: u128) -> Result<Vec<LedgerEvent>> {
        self.require_owner(ctx, "mint")?;
        let phase = self.require_pre_open(ctx, "mint")?;

        self.ledger.mint(to, amount)?;
        self.lifecycle.record(phase);

        info!("Minted {} {} to {}", amount, self.metadata.symbol, to);
        Ok(vec![LedgerEvent::Mint {
            to: to.to_string(),
            amount,
        }])
    }

    /// Owner-only, pre-open only, all-or-nothing.
    pub fn batch_mint(
        &mut self,
        ctx: &CallContext,
        accounts: &[String],
        amounts: &[u128],
    ) -> Result<Vec<LedgerEvent>> {
        self.require_owner(ctx, "batch_mint")?;
        let phase = self.require_pre_open(ctx, "batch_mint")?;

        self.ledger.mint_batch(accounts, amounts)?;
        self.lifecycle.record(phase);

        info!("Batch minted to {} accounts", accounts.len());
        Ok(accounts
            .iter()
            .zip(amounts)
            .map(|(to, amount)| LedgerEvent::Mint {
                to: to.clone(),
                amount: *amount,
            })
            .collect())
    }

    /// Manual gating: PreOpen → Open.
    pub fn open(&mut self, ctx: &CallContext) -> Result<Vec<LedgerEvent>> {
        self.require_owner(ctx, "open")?;
        self.lifecycle.open()?;
        info!("Campaign {} opened", self.contract);
        Ok(vec![LedgerEvent::PhaseChanged { phase: Phase::Open }])
    }

    /// Manual gating: Open → Closed.
    pub fn close(&mut self, ctx: &CallContext) -> Result<Vec<LedgerEvent>> {
        self.require_owner(ctx, "close")?;
        self.lifecycle.close()?;
        info!("Campaign {} closed", self.contract);
        Ok(vec![LedgerEvent::PhaseChanged {
            phase: Phase::Closed,
        }])
    }

    // ── Transfer interceptor ──

    /// Move `amount` from the caller to `to`.
    ///
    /// Ordinary destinations are plain moves, legal in every phase. Moving
    /// into a registered destination is a vote: only legal while open, and
    /// it pays the caller a reward from the pool in the same call.
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        bank: &mut dyn AssetLedger,
        to: &str,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>> {
        let phase = self.lifecycle.phase_at(ctx.timestamp);

        if !self.is_destination(to) {
            self.ledger.move_balance(ctx.caller, to, amount)?;
            self.lifecycle.record(phase);
            debug!("Transferred {} from {} to {}", amount, ctx.caller, to);
            return Ok(vec![LedgerEvent::Transfer {
                from: ctx.caller.to_string(),
                to: to.to_string(),
                amount,
            }]);
        }

        if phase != Phase::Open {
            warn!("Vote by {} rejected: campaign is {}", ctx.caller, phase);
            return Err(LedgerError::PhaseViolation {
                operation: "vote",
                phase,
            });
        }

        // Validate everything before the first write.
        let pending = self.ledger.prepare_move(ctx.caller, to, amount)?;
        let pool_balance = self.pool.balance(bank);
        let anchor = self.pool.high_water_mark().max(pool_balance);
        let reward = self
            .reward
            .compute(amount, anchor, self.ledger.total_supply())?;
        if pool_balance < reward {
            warn!(
                "Vote by {} rejected: pool holds {} but reward is {}",
                ctx.caller, pool_balance, reward
            );
            return Err(LedgerError::InsufficientPool {
                have: pool_balance,
                need: reward,
            });
        }

        if reward > 0 {
            self.pool.disburse(bank, ctx.caller, reward)?;
        }
        self.pool.observe(pool_balance);
        self.ledger.commit_move(pending);
        self.lifecycle.record(phase);

        info!(
            "{} voted {} for {} and received {} {}",
            ctx.caller,
            amount,
            to,
            reward,
            self.pool.asset()
        );

        let mut events = vec![LedgerEvent::Vote {
            voter: ctx.caller.to_string(),
            destination: to.to_string(),
            amount,
        }];
        if reward > 0 {
            events.push(LedgerEvent::Reward {
                to: ctx.caller.to_string(),
                asset: self.pool.asset().to_string(),
                amount: reward,
            });
        }
        Ok(events)
    }

    // ── Pool funding ──

    /// Host notification that `amount` was credited to the pool (native
    /// value sent to the contract, or pool tokens deposited). Accepted in any
    /// phase, never pays a reward, only refreshes the high-water mark.
    pub fn record_pool_deposit(&mut self, bank: &dyn AssetLedger, amount: u128) -> LedgerEvent {
        let pool_balance = self.pool.balance(bank);
        self.pool.observe(pool_balance);
        info!(
            "Pool funded with {} {} (balance {}, high-water mark {})",
            amount,
            self.pool.asset(),
            pool_balance,
            self.pool.high_water_mark()
        );
        LedgerEvent::PoolFunded {
            amount,
            pool_balance,
            high_water_mark: self.pool.high_water_mark(),
        }
    }

    // ── Reclamation ──

    fn require_reclaimable(&self, ctx: &CallContext, operation: &'static str) -> Result<Phase> {
        self.require_owner(ctx, operation)?;
        let phase = self.lifecycle.phase_at(ctx.timestamp);
        if self.reclaim == ReclaimPolicy::AfterClose && phase != Phase::Closed {
            warn!("{} rejected: campaign is {}", operation, phase);
            return Err(LedgerError::PhaseViolation { operation, phase });
        }
        Ok(phase)
    }

    /// Send the whole remaining pool to the owner. A second call moves zero.
    pub fn retrieve_balance(
        &mut self,
        ctx: &CallContext,
        bank: &mut dyn AssetLedger,
    ) -> Result<Vec<LedgerEvent>> {
        let asset = self.pool.asset().to_string();
        self.reclaim_assets(ctx, bank, "retrieve_balance", &[asset])
    }

    /// Send the contract's whole balance of every listed asset to the owner.
    pub fn destroy(
        &mut self,
        ctx: &CallContext,
        bank: &mut dyn AssetLedger,
        assets: &[String],
    ) -> Result<Vec<LedgerEvent>> {
        self.reclaim_assets(ctx, bank, "destroy", assets)
    }

    fn reclaim_assets(
        &mut self,
        ctx: &CallContext,
        bank: &mut dyn AssetLedger,
        operation: &'static str,
        assets: &[String],
    ) -> Result<Vec<LedgerEvent>> {
        let phase = self.require_reclaimable(ctx, operation)?;

        // Observe the pool before it is emptied.
        let pool_balance = self.pool.balance(bank);

        let mut done: Vec<(String, u128)> = Vec::with_capacity(assets.len());
        for asset in assets {
            match self.pool.drain(bank, asset, &self.owner) {
                Ok(amount) => done.push((asset.clone(), amount)),
                Err(e) => {
                    // Put back what already moved.
                    let mut stranded = Vec::new();
                    for (moved, amount) in done.iter().rev() {
                        if let Err(undo) = bank.transfer(moved, &self.owner, &self.contract, *amount)
                        {
                            warn!("{} rollback of {} failed: {}", operation, moved, undo);
                            stranded.push(format!("{} {} ({})", amount, moved, undo));
                        }
                    }
                    warn!("{} failed: {}", operation, e);
                    if stranded.is_empty() {
                        return Err(e);
                    }
                    return Err(LedgerError::AssetTransfer(format!(
                        "{}; rollback failed, left with {}: {}",
                        e,
                        self.owner,
                        stranded.join(", ")
                    )));
                }
            }
        }

        self.pool.observe(pool_balance);
        self.lifecycle.record(phase);

        Ok(done
            .into_iter()
            .map(|(asset, amount)| {
                info!("Reclaimed {} {} to {}", amount, asset, self.owner);
                LedgerEvent::Reclaimed {
                    to: self.owner.clone(),
                    asset,
                    amount,
                }
            })
            .collect())
    }
}
