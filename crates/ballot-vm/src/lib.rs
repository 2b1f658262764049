// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - CAMPAIGN RUNTIME
//
// In-process host for voting-token campaigns.
// - Deterministic contract addresses (blake3 of owner, nonce, block time)
// - One lock over contracts + bank: every call is serialized and atomic
// - Journaled bank writes: a failed call leaves contracts and bank untouched
// - JSON action ABI (see `abi`)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use ballot_core::{
    AssetLedger, CallContext, CampaignConfig, LedgerError, LedgerEvent, VotingToken, NATIVE_ASSET,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub mod abi;
pub mod bank;

pub use abi::{validate_action, BallotAction, BallotResponse};
pub use bank::{Bank, JournaledBank};

/// Address prefix for deployed campaigns
pub const CONTRACT_PREFIX: &str = "BALCon";

/// One call into a deployed campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub contract: String,
    pub caller: String,
    pub action: BallotAction,
    /// Seconds. 0 means "use the wall clock".
    #[serde(default)]
    pub block_timestamp: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HostState {
    contracts: BTreeMap<String, VotingToken>,
    bank: Bank,
    /// Deploy counter per owner
    nonce: BTreeMap<String, u64>,
}

/// Campaign host. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    state: Arc<Mutex<HostState>>,
}

fn resolve_time(block_timestamp: u64) -> u64 {
    if block_timestamp == 0 {
        chrono::Utc::now().timestamp().max(0) as u64
    } else {
        block_timestamp
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HostState>, String> {
        self.state
            .lock()
            .map_err(|_| "Failed to lock runtime state".to_string())
    }

    /// Deploy a campaign owned by `owner`. Returns the contract address.
    pub fn deploy(
        &self,
        owner: &str,
        config: CampaignConfig,
        block_timestamp: u64,
    ) -> Result<String, String> {
        let now = resolve_time(block_timestamp);
        let mut state = self.lock()?;

        let contract_nonce = state.nonce.get(owner).copied().unwrap_or(0);

        // Format: "BALCon" + first 32 hex chars of blake3(owner:nonce:time)
        let addr_input = format!("{}:{}:{}", owner, contract_nonce, now);
        let addr_hash = blake3::hash(addr_input.as_bytes());
        let address = format!(
            "{}{}",
            CONTRACT_PREFIX,
            hex::encode(&addr_hash.as_bytes()[0..16])
        );
        if state.contracts.contains_key(&address) {
            return Err(format!("Contract {} already exists", address));
        }

        let token = VotingToken::new(config, address.clone(), owner.to_string())
            .map_err(|e| e.to_string())?;

        state
            .nonce
            .insert(owner.to_string(), contract_nonce.saturating_add(1));
        state.contracts.insert(address.clone(), token);
        info!("Deployed campaign {} for {}", address, owner);
        Ok(address)
    }

    /// Execute one action. `Err` only for host failures (unknown contract,
    /// poisoned lock); contract-level failures come back as an unsuccessful
    /// [`BallotResponse`] with nothing changed.
    pub fn call(&self, request: CallRequest) -> Result<BallotResponse, String> {
        if let Err(msg) = validate_action(&request.action) {
            warn!("Rejected {}: {}", request.action.name(), msg);
            return Ok(BallotResponse::rejected(msg));
        }
        let now = resolve_time(request.block_timestamp);
        let mut state = self.lock()?;
        let HostState {
            contracts, bank, ..
        } = &mut *state;

        let token = contracts
            .get_mut(&request.contract)
            .ok_or_else(|| format!("Contract {} not found", request.contract))?;
        let ctx = CallContext::new(&request.caller, now);

        if request.action.is_query() {
            return Ok(match query(token, bank, &ctx, &request.action) {
                Ok(resp) => resp,
                Err(e) => BallotResponse::failed(&e),
            });
        }

        // Contract writes validate before mutating; bank writes are journaled.
        let mut journal = JournaledBank::new(bank);
        match execute(token, &mut journal, &ctx, &request.action) {
            Ok(events) => {
                journal.commit();
                debug!(
                    "{} on {} by {} emitted {} events",
                    request.action.name(),
                    request.contract,
                    request.caller,
                    events.len()
                );
                Ok(BallotResponse::ok(
                    format!("{} executed", request.action.name()),
                    events,
                ))
            }
            Err(e) => {
                journal.rollback();
                warn!(
                    "{} on {} by {} failed: {}",
                    request.action.name(),
                    request.contract,
                    request.caller,
                    e
                );
                Ok(BallotResponse::failed(&e))
            }
        }
    }

    /// Move `amount` of `asset` between two accounts. If `to` is a campaign
    /// whose pool is held in `asset`, the campaign is told about the deposit.
    pub fn transfer_asset(
        &self,
        asset: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, String> {
        let mut state = self.lock()?;
        let HostState {
            contracts, bank, ..
        } = &mut *state;

        bank.transfer(asset, from, to, amount)?;

        let mut events = Vec::new();
        if let Some(token) = contracts.get_mut(to) {
            if token.pool().asset() == asset {
                events.push(token.record_pool_deposit(&*bank, amount));
            }
        }
        Ok(events)
    }

    /// Send native value to a deployed campaign.
    pub fn send_native(
        &self,
        from: &str,
        contract: &str,
        amount: u128,
    ) -> Result<Vec<LedgerEvent>, String> {
        if !self.contract_exists(contract)? {
            return Err(format!("Contract {} not found", contract));
        }
        self.transfer_asset(NATIVE_ASSET, from, contract, amount)
    }

    /// Mint host assets (genesis, faucets, tests).
    pub fn issue(&self, asset: &str, holder: &str, amount: u128) -> Result<(), String> {
        let mut state = self.lock()?;
        state.bank.issue(asset, holder, amount)?;
        debug!("Issued {} {} to {}", amount, asset, holder);
        Ok(())
    }

    pub fn asset_balance(&self, asset: &str, holder: &str) -> Result<u128, String> {
        Ok(self.lock()?.bank.balance_of(asset, holder))
    }

    pub fn get_token(&self, address: &str) -> Result<VotingToken, String> {
        self.lock()?
            .contracts
            .get(address)
            .cloned()
            .ok_or_else(|| format!("Contract {} not found", address))
    }

    pub fn contract_exists(&self, address: &str) -> Result<bool, String> {
        Ok(self.lock()?.contracts.contains_key(address))
    }

    pub fn list_contracts(&self) -> Result<Vec<String>, String> {
        Ok(self.lock()?.contracts.keys().cloned().collect())
    }

    pub fn contract_count(&self) -> Result<usize, String> {
        Ok(self.lock()?.contracts.len())
    }

    /// Serialize contracts, bank and nonces for persistence.
    pub fn serialize_all(&self) -> Result<Vec<u8>, String> {
        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            contracts: &'a BTreeMap<String, VotingToken>,
            bank: &'a Bank,
            nonce: &'a BTreeMap<String, u64>,
            roots: BTreeMap<&'a String, String>,
        }
        let state = self.lock()?;
        let roots = state
            .contracts
            .iter()
            .map(|(addr, token)| token.state_root().map(|root| (addr, root)))
            .collect::<Result<BTreeMap<_, _>, LedgerError>>()
            .map_err(|e| format!("Failed to hash runtime state: {}", e))?;
        let snapshot = SnapshotRef {
            contracts: &state.contracts,
            bank: &state.bank,
            nonce: &state.nonce,
            roots,
        };
        serde_json::to_vec(&snapshot)
            .map_err(|e| format!("Failed to serialize runtime state: {}", e))
    }

    /// Restore a snapshot produced by [`Runtime::serialize_all`]. Every
    /// contract's state root is checked before anything is replaced.
    pub fn deserialize_all(&self, data: &[u8]) -> Result<usize, String> {
        #[derive(Deserialize)]
        struct Snapshot {
            contracts: BTreeMap<String, VotingToken>,
            bank: Bank,
            nonce: BTreeMap<String, u64>,
            #[serde(default)]
            roots: BTreeMap<String, String>,
        }
        let snapshot: Snapshot = serde_json::from_slice(data)
            .map_err(|e| format!("Failed to deserialize runtime state: {}", e))?;

        for (addr, token) in &snapshot.contracts {
            if token.contract() != addr {
                return Err(format!("Contract {} stored under {}", token.contract(), addr));
            }
            if let Some(expected) = snapshot.roots.get(addr) {
                let actual = token
                    .state_root()
                    .map_err(|e| format!("Failed to hash {}: {}", addr, e))?;
                if &actual != expected {
                    return Err(format!(
                        "State root mismatch for {}: expected {} got {}",
                        addr, expected, actual
                    ));
                }
            }
        }

        let count = snapshot.contracts.len();
        let mut state = self.lock()?;
        *state = HostState {
            contracts: snapshot.contracts,
            bank: snapshot.bank,
            nonce: snapshot.nonce,
        };
        info!("Restored {} campaigns", count);
        Ok(count)
    }
}

fn execute(
    token: &mut VotingToken,
    bank: &mut JournaledBank<'_>,
    ctx: &CallContext,
    action: &BallotAction,
) -> Result<Vec<LedgerEvent>, LedgerError> {
    match action {
        BallotAction::Mint { to, amount } => token.mint(ctx, to, *amount),
        BallotAction::BatchMint { accounts, amounts } => token.batch_mint(ctx, accounts, amounts),
        BallotAction::Transfer { to, amount } => token.transfer(ctx, bank, to, *amount),
        BallotAction::Open => token.open(ctx),
        BallotAction::Close => token.close(ctx),
        BallotAction::RetrieveBalance => token.retrieve_balance(ctx, bank),
        BallotAction::Destroy { assets } => token.destroy(ctx, bank, assets),
        other => Err(LedgerError::UnsupportedOperation {
            operation: other.name(),
        }),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, LedgerError> {
    serde_json::to_string(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn query(
    token: &VotingToken,
    bank: &Bank,
    ctx: &CallContext,
    action: &BallotAction,
) -> Result<BallotResponse, LedgerError> {
    let name = action.name();
    let data = match action {
        BallotAction::BalanceOf { account } => token.balance_of(account).to_string(),
        BallotAction::TotalSupply => token.total_supply().to_string(),
        BallotAction::PhaseState => to_json(&token.phase_state(ctx.timestamp))?,
        BallotAction::Destination { index } => token.destination(*index)?.to_string(),
        BallotAction::Destinations => to_json(&token.destinations())?,
        BallotAction::Results => {
            let rows: Vec<serde_json::Value> = token
                .results()
                .into_iter()
                .map(|(destination, votes)| {
                    serde_json::json!({ "destination": destination, "votes": votes.to_string() })
                })
                .collect();
            to_json(&rows)?
        }
        BallotAction::PoolHighWaterMark => token.pool_high_water_mark().to_string(),
        BallotAction::PoolBalance => token.pool_balance(bank).to_string(),
        BallotAction::PayoutAmount { amount } => token.payout_amount(bank, *amount)?.to_string(),
        BallotAction::TokenInfo => to_json(&serde_json::json!({
            "name": token.metadata.name,
            "symbol": token.metadata.symbol,
            "decimals": token.metadata.decimals,
            "contract": token.contract(),
            "owner": token.owner(),
            "total_supply": token.total_supply().to_string(),
            "destinations": token.destination_count(),
            "pool_asset": token.pool().asset(),
            "reward": token.reward_policy(),
            "reclaim": token.reclaim_policy(),
            "phase": token.phase(ctx.timestamp),
        }))?,
        other => {
            return Err(LedgerError::UnsupportedOperation {
                operation: other.name(),
            })
        }
    };
    Ok(BallotResponse::data(data, format!("{} ok", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_core::{Gating, PhaseState, PoolSource, ReclaimPolicy, RewardPolicy};

    const OWNER: &str = "0xowner";
    const ALICE: &str = "0xa11ce";
    const BOB: &str = "0xb0b";
    const YES: &str = "0x0000000000000000000000000000000000000001";
    const NO: &str = "0x0000000000000000000000000000000000000002";
    const REWARD: &str = "RWD";

    const START: u64 = 1_000;
    const END: u64 = 2_000;

    fn timed_config() -> CampaignConfig {
        CampaignConfig {
            name: "Voting Token".to_string(),
            symbol: "VOT".to_string(),
            decimals: 8,
            destinations: vec![YES.to_string(), NO.to_string()],
            reclaim: ReclaimPolicy::AfterClose,
            gating: Gating::Time {
                start_time: START,
                end_time: END,
            },
            pool: PoolSource::Asset {
                asset_id: REWARD.to_string(),
            },
            reward: RewardPolicy::FixedRatio { divisor: 10 },
        }
    }

    fn call(rt: &Runtime, contract: &str, caller: &str, action: BallotAction, at: u64) -> BallotResponse {
        rt.call(CallRequest {
            contract: contract.to_string(),
            caller: caller.to_string(),
            action,
            block_timestamp: at,
        })
        .unwrap()
    }

    fn funded_campaign() -> (Runtime, String) {
        let rt = Runtime::new();
        let addr = rt.deploy(OWNER, timed_config(), 10).unwrap();
        rt.issue(REWARD, OWNER, 1_000_000).unwrap();
        rt.transfer_asset(REWARD, OWNER, &addr, 1_000_000).unwrap();
        let resp = call(
            &rt,
            &addr,
            OWNER,
            BallotAction::Mint {
                to: ALICE.to_string(),
                amount: 1_000,
            },
            500,
        );
        assert!(resp.success, "{}", resp.message);
        (rt, addr)
    }

    #[test]
    fn test_runtime_creation() {
        let rt = Runtime::new();
        assert_eq!(rt.contract_count().unwrap(), 0);
        assert!(rt.list_contracts().unwrap().is_empty());
    }

    #[test]
    fn test_deploy_address_is_deterministic() {
        let a = Runtime::new().deploy(OWNER, timed_config(), 42).unwrap();
        let b = Runtime::new().deploy(OWNER, timed_config(), 42).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(CONTRACT_PREFIX));
        assert_eq!(a.len(), CONTRACT_PREFIX.len() + 32);
    }

    #[test]
    fn test_same_owner_same_block_gets_fresh_address() {
        let rt = Runtime::new();
        let a = rt.deploy(OWNER, timed_config(), 42).unwrap();
        let b = rt.deploy(OWNER, timed_config(), 42).unwrap();
        assert_ne!(a, b);
        assert_eq!(rt.contract_count().unwrap(), 2);
    }

    #[test]
    fn test_deploy_rejects_invalid_config() {
        let mut cfg = timed_config();
        cfg.destinations.clear();
        assert!(Runtime::new().deploy(OWNER, cfg, 1).is_err());
    }

    #[test]
    fn test_unknown_contract_is_host_error() {
        let rt = Runtime::new();
        let result = rt.call(CallRequest {
            contract: "BALConmissing".to_string(),
            caller: ALICE.to_string(),
            action: BallotAction::TotalSupply,
            block_timestamp: 1,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_vote_pays_reward_through_bank() {
        let (rt, addr) = funded_campaign();
        let resp = call(
            &rt,
            &addr,
            ALICE,
            BallotAction::Transfer {
                to: YES.to_string(),
                amount: 1_000,
            },
            1_500,
        );
        assert!(resp.success, "{}", resp.message);
        assert_eq!(rt.asset_balance(REWARD, ALICE).unwrap(), 100);
        assert_eq!(rt.asset_balance(REWARD, &addr).unwrap(), 999_900);

        let bal = call(
            &rt,
            &addr,
            ALICE,
            BallotAction::BalanceOf {
                account: YES.to_string(),
            },
            1_500,
        );
        assert_eq!(bal.data.as_deref(), Some("1000"));
    }

    #[test]
    fn test_failed_call_changes_nothing() {
        let (rt, addr) = funded_campaign();
        let before = rt.get_token(&addr).unwrap();

        // Voting before the window opens.
        let resp = call(
            &rt,
            &addr,
            ALICE,
            BallotAction::Transfer {
                to: YES.to_string(),
                amount: 10,
            },
            900,
        );
        assert!(!resp.success);
        assert_eq!(resp.error_kind.as_deref(), Some("phase_violation"));
        assert_eq!(rt.get_token(&addr).unwrap(), before);
        assert_eq!(rt.asset_balance(REWARD, ALICE).unwrap(), 0);
    }

    #[test]
    fn test_insufficient_pool_rolls_back() {
        let rt = Runtime::new();
        let addr = rt.deploy(OWNER, timed_config(), 10).unwrap();
        rt.issue(REWARD, OWNER, 50).unwrap();
        rt.transfer_asset(REWARD, OWNER, &addr, 50).unwrap();
        call(
            &rt,
            &addr,
            OWNER,
            BallotAction::Mint {
                to: ALICE.to_string(),
                amount: 1_000,
            },
            500,
        );
        let resp = call(
            &rt,
            &addr,
            ALICE,
            BallotAction::Transfer {
                to: YES.to_string(),
                amount: 1_000,
            },
            1_500,
        );
        assert_eq!(resp.error_kind.as_deref(), Some("insufficient_pool"));
        assert_eq!(rt.get_token(&addr).unwrap().balance_of(ALICE), 1_000);
        assert_eq!(rt.asset_balance(REWARD, &addr).unwrap(), 50);
    }

    #[test]
    fn test_non_owner_mint_unauthorized() {
        let (rt, addr) = funded_campaign();
        let resp = call(
            &rt,
            &addr,
            BOB,
            BallotAction::Mint {
                to: BOB.to_string(),
                amount: 1,
            },
            500,
        );
        assert_eq!(resp.error_kind.as_deref(), Some("unauthorized"));
    }

    #[test]
    fn test_malformed_action_rejected_before_contract() {
        let (rt, addr) = funded_campaign();
        let resp = call(
            &rt,
            &addr,
            ALICE,
            BallotAction::Transfer {
                to: String::new(),
                amount: 1,
            },
            1_500,
        );
        assert_eq!(resp.error_kind.as_deref(), Some("invalid_action"));
    }

    #[test]
    fn test_phase_state_query() {
        let (rt, addr) = funded_campaign();
        let resp = call(&rt, &addr, BOB, BallotAction::PhaseState, 2_500);
        let state: PhaseState = serde_json::from_str(resp.data.as_deref().unwrap()).unwrap();
        assert!(state.has_started);
        assert!(state.has_ended);
    }

    #[test]
    fn test_destination_out_of_range() {
        let (rt, addr) = funded_campaign();
        let ok = call(&rt, &addr, BOB, BallotAction::Destination { index: 1 }, 1);
        assert_eq!(ok.data.as_deref(), Some(NO));
        let bad = call(&rt, &addr, BOB, BallotAction::Destination { index: 2 }, 1);
        assert_eq!(bad.error_kind.as_deref(), Some("index_out_of_range"));
    }

    #[test]
    fn test_deposit_notifies_pool() {
        let rt = Runtime::new();
        let addr = rt.deploy(OWNER, timed_config(), 10).unwrap();
        rt.issue(REWARD, OWNER, 700).unwrap();
        let events = rt.transfer_asset(REWARD, OWNER, &addr, 700).unwrap();
        assert_eq!(
            events,
            vec![LedgerEvent::PoolFunded {
                amount: 700,
                pool_balance: 700,
                high_water_mark: 700,
            }]
        );
        assert_eq!(rt.get_token(&addr).unwrap().pool_high_water_mark(), 700);
    }

    #[test]
    fn test_send_native_requires_contract() {
        let rt = Runtime::new();
        rt.issue(NATIVE_ASSET, ALICE, 10).unwrap();
        assert!(rt.send_native(ALICE, "BALConnowhere", 10).is_err());
        assert_eq!(rt.asset_balance(NATIVE_ASSET, ALICE).unwrap(), 10);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let (rt, addr) = funded_campaign();
        let bytes = rt.serialize_all().unwrap();

        let restored = Runtime::new();
        assert_eq!(restored.deserialize_all(&bytes).unwrap(), 1);
        assert_eq!(restored.get_token(&addr).unwrap(), rt.get_token(&addr).unwrap());
        assert_eq!(restored.asset_balance(REWARD, &addr).unwrap(), 1_000_000);

        // Nonces survive: the next deploy does not collide.
        let next = restored.deploy(OWNER, timed_config(), 10).unwrap();
        assert_ne!(next, addr);
    }

    #[test]
    fn test_deserialize_rejects_tampered_state() {
        let (rt, addr) = funded_campaign();
        let bytes = rt.serialize_all().unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["contracts"][&addr]["metadata"]["name"] = serde_json::json!("Forged");
        let tampered = serde_json::to_vec(&value).unwrap();

        let restored = Runtime::new();
        let err = restored.deserialize_all(&tampered).unwrap_err();
        assert!(err.contains("State root mismatch"));
        assert_eq!(restored.contract_count().unwrap(), 0);
    }

    #[test]
    fn test_serialize_balances_above_u64() {
        let rt = Runtime::new();
        let mut cfg = timed_config();
        cfg.decimals = 18;
        cfg.gating = Gating::Manual;
        cfg.pool = PoolSource::Native;
        let addr = rt.deploy(OWNER, cfg, 10).unwrap();

        // 100 whole tokens at 18 decimals
        let big: u128 = 100_000_000_000_000_000_000;
        assert!(big > u128::from(u64::MAX));
        let resp = call(
            &rt,
            &addr,
            OWNER,
            BallotAction::Mint {
                to: ALICE.to_string(),
                amount: big,
            },
            10,
        );
        assert!(resp.success, "{}", resp.message);
        rt.issue(NATIVE_ASSET, OWNER, big).unwrap();
        rt.send_native(OWNER, &addr, big).unwrap();

        let bytes = rt.serialize_all().unwrap();
        // Still usable after persisting.
        assert_eq!(rt.contract_count().unwrap(), 1);

        let restored = Runtime::new();
        assert_eq!(restored.deserialize_all(&bytes).unwrap(), 1);
        assert_eq!(restored.get_token(&addr).unwrap().balance_of(ALICE), big);
        assert_eq!(restored.asset_balance(NATIVE_ASSET, &addr).unwrap(), big);
        assert_eq!(restored.get_token(&addr).unwrap().pool_high_water_mark(), big);
    }
}
