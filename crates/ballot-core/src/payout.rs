// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - PAYOUT ENGINE
//
// Exactly one reward policy per campaign:
// - FixedRatio: reward = amount / divisor            (divisor 100 → 1%)
// - PoolShare:  reward = hwm * amount / total_supply (share of the pool equal
//               to the share of supply being moved)
// All integer math, truncating. The remainder stays in the pool.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RewardPolicy {
    FixedRatio {
        #[serde(with = "crate::serde_u128")]
        divisor: u128,
    },
    PoolShare,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        RewardPolicy::FixedRatio { divisor: 100 }
    }
}

impl RewardPolicy {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            RewardPolicy::FixedRatio { divisor: 0 } => {
                Err("fixed_ratio divisor must be > 0".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Reward earned by moving `amount` to a destination.
    pub fn compute(&self, amount: u128, high_water_mark: u128, total_supply: u128) -> Result<u128> {
        match self {
            RewardPolicy::FixedRatio { divisor } => fixed_ratio(amount, *divisor),
            RewardPolicy::PoolShare => pool_share(high_water_mark, amount, total_supply),
        }
    }
}

pub fn fixed_ratio(amount: u128, divisor: u128) -> Result<u128> {
    amount
        .checked_div(divisor)
        .ok_or_else(|| LedgerError::InvalidConfig("fixed_ratio divisor is zero".to_string()))
}

/// `(hwm * amount) / total_supply`, multiplied first in 256 bits so nothing
/// is lost to early division and the product cannot overflow.
pub fn pool_share(high_water_mark: u128, amount: u128, total_supply: u128) -> Result<u128> {
    if total_supply == 0 {
        return Ok(0);
    }
    let product = U256::from(high_water_mark) * U256::from(amount);
    let share = product / U256::from(total_supply);
    if share > U256::from(u128::MAX) {
        return Err(LedgerError::ArithmeticOverflow);
    }
    Ok(share.as_u128())
}
