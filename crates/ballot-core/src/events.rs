//! Events emitted by committed writes. Hosts index these; a failed call
//! emits none.

use serde::{Deserialize, Serialize};

use crate::lifecycle::Phase;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Mint {
        to: String,
        #[serde(with = "crate::serde_u128")]
        amount: u128,
    },
    /// Ordinary peer-to-peer move
    Transfer {
        from: String,
        to: String,
        #[serde(with = "crate::serde_u128")]
        amount: u128,
    },
    /// Move into a registered destination
    Vote {
        voter: String,
        destination: String,
        #[serde(with = "crate::serde_u128")]
        amount: u128,
    },
    Reward {
        to: String,
        asset: String,
        #[serde(with = "crate::serde_u128")]
        amount: u128,
    },
    PhaseChanged { phase: Phase },
    PoolFunded {
        #[serde(with = "crate::serde_u128")]
        amount: u128,
        #[serde(with = "crate::serde_u128")]
        pool_balance: u128,
        #[serde(with = "crate::serde_u128")]
        high_water_mark: u128,
    },
    Reclaimed {
        to: String,
        asset: String,
        #[serde(with = "crate::serde_u128")]
        amount: u128,
    },
}
