//! Fuzz target: random call sequences against one campaign
//!
//! Drives a manually gated campaign through arbitrary mints, transfers,
//! phase changes and reclaims. The runtime must never panic, and the
//! token's supply must always equal the sum of balances.
//!
//! Run: cargo +nightly fuzz run fuzz_transfer_sequence

#![no_main]
use arbitrary::Arbitrary;
use ballot_core::{CampaignConfig, Gating, PoolSource, ReclaimPolicy, RewardPolicy};
use ballot_vm::{BallotAction, CallRequest, Runtime};
use libfuzzer_sys::fuzz_target;

const OWNER: &str = "owner";
const ACCOUNTS: [&str; 4] = ["owner", "alice", "bob", "carol"];
const DESTINATIONS: [&str; 2] = ["choice-a", "choice-b"];

#[derive(Arbitrary, Debug)]
enum Step {
    Mint { to: u8, amount: u64 },
    Transfer { from: u8, to: u8, amount: u64 },
    Open,
    Close,
    Fund { amount: u64 },
    Retrieve,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    pool_share: bool,
    divisor: u16,
    steps: Vec<Step>,
}

fn account(idx: u8) -> String {
    let all: Vec<&str> = ACCOUNTS.iter().chain(DESTINATIONS.iter()).copied().collect();
    all[idx as usize % all.len()].to_string()
}

fuzz_target!(|input: FuzzInput| {
    let reward = if input.pool_share {
        RewardPolicy::PoolShare
    } else {
        RewardPolicy::FixedRatio {
            divisor: u128::from(input.divisor.max(1)),
        }
    };
    let config = CampaignConfig {
        name: "Fuzz Poll".to_string(),
        symbol: "FZP".to_string(),
        decimals: 0,
        destinations: DESTINATIONS.iter().map(|d| d.to_string()).collect(),
        reclaim: ReclaimPolicy::AfterClose,
        gating: Gating::Manual,
        pool: PoolSource::Native,
        reward,
    };

    let rt = Runtime::new();
    let Ok(addr) = rt.deploy(OWNER, config, 1) else {
        return;
    };
    if rt.issue(ballot_core::NATIVE_ASSET, OWNER, u128::from(u64::MAX)).is_err() {
        return;
    }

    // Bound the sequence length to keep iterations fast.
    for step in input.steps.iter().take(64) {
        let (caller, action) = match step {
            Step::Mint { to, amount } => (
                OWNER.to_string(),
                BallotAction::Mint {
                    to: account(*to),
                    amount: u128::from(*amount),
                },
            ),
            Step::Transfer { from, to, amount } => (
                account(*from),
                BallotAction::Transfer {
                    to: account(*to),
                    amount: u128::from(*amount),
                },
            ),
            Step::Open => (OWNER.to_string(), BallotAction::Open),
            Step::Close => (OWNER.to_string(), BallotAction::Close),
            Step::Retrieve => (OWNER.to_string(), BallotAction::RetrieveBalance),
            Step::Fund { amount } => {
                let _ = rt.send_native(OWNER, &addr, u128::from(*amount));
                continue;
            }
        };
        let _ = rt.call(CallRequest {
            contract: addr.clone(),
            caller,
            action,
            block_timestamp: 1,
        });

        let token = rt.get_token(&addr).expect("campaign exists");
        assert_eq!(
            token.ledger().sum_of_balances(),
            Some(token.total_supply()),
            "supply diverged from balances"
        );
    }
});
