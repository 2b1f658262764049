// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - CORE MODULE
//
// Transfer-triggered distribution ledger. A fungible token whose transfers
// into registered destinations (poll choices, questions, alternatives) pay
// the sender a proportional reward from a separately funded pool, during a
// time- or owner-gated campaign window.
// All amounts are u128 atomic units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod payout;
pub mod pool;
pub mod serde_u128;
pub mod token;

pub use config::{CampaignConfig, ReclaimPolicy};
pub use error::{LedgerError, Result};
pub use events::LedgerEvent;
pub use ledger::BalanceLedger;
pub use lifecycle::{Gating, Lifecycle, Phase, PhaseState};
pub use payout::RewardPolicy;
pub use pool::{AssetLedger, DistributionPool, PoolSource, NATIVE_ASSET};
pub use token::{CallContext, TokenMetadata, VotingToken};

/// Token name length bound (characters)
pub const MAX_NAME_LEN: usize = 64;
/// Ticker symbol length bound (characters)
pub const MAX_SYMBOL_LEN: usize = 8;
/// Display decimals bound
pub const MAX_DECIMALS: u8 = 18;
/// Upper bound on registered destinations per campaign
pub const MAX_DESTINATIONS: usize = 256;
