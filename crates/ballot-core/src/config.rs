use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::lifecycle::Gating;
use crate::payout::RewardPolicy;
use crate::pool::PoolSource;
use crate::{MAX_DECIMALS, MAX_DESTINATIONS, MAX_NAME_LEN, MAX_SYMBOL_LEN};

/// When the owner may reclaim leftover pool funds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimPolicy {
    #[default]
    AfterClose,
    Anytime,
}

/// Campaign construction parameters
///
/// ```toml
/// name = "Referendum 2"
/// symbol = "RSB2"
/// decimals = 8
/// destinations = ["BALWyes...", "BALWno..."]
///
/// [gating]
/// mode = "time"
/// start_time = 2524608000
/// end_time = 2556144000
///
/// [pool]
/// kind = "asset"
/// asset_id = "CHSB"
///
/// [reward]
/// policy = "fixed_ratio"
/// divisor = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub destinations: Vec<String>,
    /// Must precede the table-valued fields for TOML output
    #[serde(default)]
    pub reclaim: ReclaimPolicy,
    pub gating: Gating,
    pub pool: PoolSource,
    #[serde(default)]
    pub reward: RewardPolicy,
}

impl CampaignConfig {
    /// Load campaign config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: CampaignConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load campaign config from environment variables
    ///
    /// `BALLOT_DESTINATIONS` is comma-separated. `BALLOT_START_TIME` and
    /// `BALLOT_END_TIME` select time gating; without them gating is manual.
    /// `BALLOT_POOL_ASSET` selects an asset pool; without it the pool is
    /// native value. `BALLOT_REWARD_DIVISOR` selects fixed-ratio rewards;
    /// without it rewards are a share of the pool.
    pub fn load_from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let name = std::env::var("BALLOT_NAME").map_err(|_| "BALLOT_NAME not set")?;
        let symbol = std::env::var("BALLOT_SYMBOL").map_err(|_| "BALLOT_SYMBOL not set")?;
        let decimals: u8 = std::env::var("BALLOT_DECIMALS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()?;

        let destinations: Vec<String> = std::env::var("BALLOT_DESTINATIONS")
            .map_err(|_| "BALLOT_DESTINATIONS not set")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let gating = match (
            std::env::var("BALLOT_START_TIME"),
            std::env::var("BALLOT_END_TIME"),
        ) {
            (Ok(start), Ok(end)) => Gating::Time {
                start_time: start.parse()?,
                end_time: end.parse()?,
            },
            _ => Gating::Manual,
        };

        let pool = match std::env::var("BALLOT_POOL_ASSET") {
            Ok(asset_id) => PoolSource::Asset { asset_id },
            Err(_) => PoolSource::Native,
        };

        let reward = match std::env::var("BALLOT_REWARD_DIVISOR") {
            Ok(d) => RewardPolicy::FixedRatio { divisor: d.parse()? },
            Err(_) => RewardPolicy::PoolShare,
        };

        let reclaim = match std::env::var("BALLOT_RECLAIM").as_deref() {
            Ok("anytime") => ReclaimPolicy::Anytime,
            _ => ReclaimPolicy::AfterClose,
        };

        Ok(Self {
            name,
            symbol,
            decimals,
            destinations,
            reclaim,
            gating,
            pool,
            reward,
        })
    }

    /// Save campaign config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(format!("Name must be 1-{} characters", MAX_NAME_LEN));
        }
        if self.symbol.is_empty() || self.symbol.len() > MAX_SYMBOL_LEN {
            return Err(format!("Symbol must be 1-{} characters", MAX_SYMBOL_LEN));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(format!("Decimals must be 0-{}", MAX_DECIMALS));
        }

        if self.destinations.is_empty() {
            return Err("At least one destination is required".to_string());
        }
        if self.destinations.len() > MAX_DESTINATIONS {
            return Err(format!("At most {} destinations", MAX_DESTINATIONS));
        }
        for (i, d) in self.destinations.iter().enumerate() {
            if d.is_empty() {
                return Err(format!("Destination {} is empty", i));
            }
            if self.destinations[..i].contains(d) {
                return Err(format!("Duplicate destination: {}", d));
            }
        }

        self.gating.validate()?;
        self.pool.validate()?;
        self.reward.validate()?;
        Ok(())
    }
}
