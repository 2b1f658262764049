// SPDX-License-Identifier: AGPL-3.0-only
//! # Campaign Contract ABI
//!
//! JSON interface of a deployed campaign. A call carries one
//! [`BallotAction`] (tagged by `"action"`) and gets back a
//! [`BallotResponse`]. Amounts travel as decimal strings because JSON has no
//! 128-bit integers.
//!
//! ```json
//! {"action":"Transfer","to":"0x…01","amount":"1000"}
//! ```

use ballot_core::{serde_u128, LedgerError, LedgerEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action")]
pub enum BallotAction {
    // ── Writes ──
    /// Owner-only, before the campaign opens.
    Mint {
        to: String,
        #[serde(with = "serde_u128")]
        amount: u128,
    },
    /// Owner-only, before the campaign opens. All-or-nothing.
    BatchMint {
        accounts: Vec<String>,
        #[serde(with = "serde_u128::vec")]
        amounts: Vec<u128>,
    },
    /// Move caller's tokens; a registered destination makes it a vote.
    Transfer {
        to: String,
        #[serde(with = "serde_u128")]
        amount: u128,
    },
    /// Manual gating only.
    Open,
    /// Manual gating only.
    Close,
    /// Owner reclaims the remaining pool.
    RetrieveBalance,
    /// Owner reclaims the contract's whole balance of each listed asset.
    Destroy { assets: Vec<String> },

    // ── Read-only queries ──
    BalanceOf { account: String },
    TotalSupply,
    PhaseState,
    Destination { index: usize },
    Destinations,
    Results,
    PoolHighWaterMark,
    PoolBalance,
    /// Preview of the reward `amount` would earn; no state change.
    PayoutAmount {
        #[serde(with = "serde_u128")]
        amount: u128,
    },
    TokenInfo,
}

impl BallotAction {
    pub fn is_query(&self) -> bool {
        !matches!(
            self,
            BallotAction::Mint { .. }
                | BallotAction::BatchMint { .. }
                | BallotAction::Transfer { .. }
                | BallotAction::Open
                | BallotAction::Close
                | BallotAction::RetrieveBalance
                | BallotAction::Destroy { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            BallotAction::Mint { .. } => "Mint",
            BallotAction::BatchMint { .. } => "BatchMint",
            BallotAction::Transfer { .. } => "Transfer",
            BallotAction::Open => "Open",
            BallotAction::Close => "Close",
            BallotAction::RetrieveBalance => "RetrieveBalance",
            BallotAction::Destroy { .. } => "Destroy",
            BallotAction::BalanceOf { .. } => "BalanceOf",
            BallotAction::TotalSupply => "TotalSupply",
            BallotAction::PhaseState => "PhaseState",
            BallotAction::Destination { .. } => "Destination",
            BallotAction::Destinations => "Destinations",
            BallotAction::Results => "Results",
            BallotAction::PoolHighWaterMark => "PoolHighWaterMark",
            BallotAction::PoolBalance => "PoolBalance",
            BallotAction::PayoutAmount { .. } => "PayoutAmount",
            BallotAction::TokenInfo => "TokenInfo",
        }
    }
}

/// Reject structurally malformed actions before they reach the contract.
/// Semantic checks (balances, phase, arity) are the contract's job.
pub fn validate_action(action: &BallotAction) -> Result<(), String> {
    match action {
        BallotAction::Mint { to, .. } => {
            if to.is_empty() {
                return Err("Mint: recipient address is empty".to_string());
            }
            Ok(())
        }
        BallotAction::BatchMint { accounts, .. } => {
            if accounts.iter().any(|a| a.is_empty()) {
                return Err("BatchMint: recipient address is empty".to_string());
            }
            Ok(())
        }
        BallotAction::Transfer { to, .. } => {
            if to.is_empty() {
                return Err("Transfer: recipient address is empty".to_string());
            }
            Ok(())
        }
        BallotAction::Destroy { assets } => {
            if assets.iter().any(|a| a.is_empty()) {
                return Err("Destroy: asset id is empty".to_string());
            }
            Ok(())
        }
        BallotAction::BalanceOf { account } => {
            if account.is_empty() {
                return Err("BalanceOf: account is empty".to_string());
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Result of one call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BallotResponse {
    pub success: bool,
    /// Stable error code (`"phase_violation"`, …) when `success` is false
    #[serde(default)]
    pub error_kind: Option<String>,
    /// JSON-encoded or decimal return data for queries
    #[serde(default)]
    pub data: Option<String>,
    /// Human-readable message
    pub message: String,
    /// Events emitted by this call
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

impl BallotResponse {
    pub fn ok(message: String, events: Vec<LedgerEvent>) -> Self {
        Self {
            success: true,
            error_kind: None,
            data: None,
            message,
            events,
        }
    }

    pub fn data(data: String, message: String) -> Self {
        Self {
            success: true,
            error_kind: None,
            data: Some(data),
            message,
            events: Vec::new(),
        }
    }

    pub fn failed(err: &LedgerError) -> Self {
        Self {
            success: false,
            error_kind: Some(err.kind().to_string()),
            data: None,
            message: err.to_string(),
            events: Vec::new(),
        }
    }

    pub fn rejected(message: String) -> Self {
        Self {
            success: false,
            error_kind: Some("invalid_action".to_string()),
            data: None,
            message,
            events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_json_shape() {
        let action = BallotAction::Transfer {
            to: "0x01".to_string(),
            amount: 1_000,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"action":"Transfer","to":"0x01","amount":"1000"}"#);
    }

    #[test]
    fn test_batch_mint_accepts_strings_and_integers() {
        let json = r#"{"action":"BatchMint","accounts":["a","b"],"amounts":["340282366920938463463374607431768211455",7]}"#;
        let action: BallotAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            BallotAction::BatchMint {
                accounts: vec!["a".to_string(), "b".to_string()],
                amounts: vec![u128::MAX, 7],
            }
        );
    }

    #[test]
    fn test_unit_actions_parse() {
        let open: BallotAction = serde_json::from_str(r#"{"action":"Open"}"#).unwrap();
        assert_eq!(open, BallotAction::Open);
        assert!(!open.is_query());
        let q: BallotAction = serde_json::from_str(r#"{"action":"Results"}"#).unwrap();
        assert!(q.is_query());
    }

    #[test]
    fn test_validate_empty_recipient() {
        let a = BallotAction::Transfer {
            to: String::new(),
            amount: 5,
        };
        assert!(validate_action(&a).is_err());
    }

    #[test]
    fn test_validate_zero_transfer_allowed() {
        let a = BallotAction::Transfer {
            to: "x".to_string(),
            amount: 0,
        };
        assert!(validate_action(&a).is_ok());
    }

    #[test]
    fn test_failed_response_carries_kind() {
        let resp = BallotResponse::failed(&LedgerError::InsufficientPool { have: 1, need: 2 });
        assert!(!resp.success);
        assert_eq!(resp.error_kind.as_deref(), Some("insufficient_pool"));
        assert!(resp.message.contains("Insufficient pool"));
    }
}
