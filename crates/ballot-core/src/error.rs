// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - LEDGER ERRORS
//
// Every failing operation surfaces exactly one of these kinds and leaves the
// ledger untouched. Nothing here is recovered or retried internally.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::lifecycle::Phase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller is not the owner for an owner-gated operation
    Unauthorized { caller: String },
    /// Operation attempted outside its legal phase
    PhaseViolation {
        operation: &'static str,
        phase: Phase,
    },
    InsufficientBalance {
        account: String,
        have: u128,
        need: u128,
    },
    /// Reward or reclamation exceeds what the pool holds
    InsufficientPool { have: u128, need: u128 },
    /// Batch operation's parallel lists differ in length
    ArityMismatch { accounts: usize, amounts: usize },
    IndexOutOfRange { index: usize, len: usize },
    /// Explicit transition requested on a time-gated campaign
    UnsupportedOperation { operation: &'static str },
    InvalidConfig(String),
    ArithmeticOverflow,
    /// The pool-asset ledger refused a transfer
    AssetTransfer(String),
    /// State could not be encoded
    Serialization(String),
}

impl LedgerError {
    /// Stable machine-readable code, used by client tooling to branch on the kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized { .. } => "unauthorized",
            LedgerError::PhaseViolation { .. } => "phase_violation",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::InsufficientPool { .. } => "insufficient_pool",
            LedgerError::ArityMismatch { .. } => "arity_mismatch",
            LedgerError::IndexOutOfRange { .. } => "index_out_of_range",
            LedgerError::UnsupportedOperation { .. } => "unsupported_operation",
            LedgerError::InvalidConfig(_) => "invalid_config",
            LedgerError::ArithmeticOverflow => "arithmetic_overflow",
            LedgerError::AssetTransfer(_) => "asset_transfer",
            LedgerError::Serialization(_) => "serialization",
        }
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LedgerError::Unauthorized { caller } => {
                write!(f, "Unauthorized: {} is not the owner", caller)
            }
            LedgerError::PhaseViolation { operation, phase } => {
                write!(f, "{} is not allowed while the campaign is {}", operation, phase)
            }
            LedgerError::InsufficientBalance {
                account,
                have,
                need,
            } => write!(
                f,
                "Insufficient balance: {} has {} need {}",
                account, have, need
            ),
            LedgerError::InsufficientPool { have, need } => {
                write!(f, "Insufficient pool: have {} need {}", have, need)
            }
            LedgerError::ArityMismatch { accounts, amounts } => write!(
                f,
                "Arity mismatch: {} accounts but {} amounts",
                accounts, amounts
            ),
            LedgerError::IndexOutOfRange { index, len } => {
                write!(f, "Destination index {} out of range (count {})", index, len)
            }
            LedgerError::UnsupportedOperation { operation } => {
                write!(f, "{} requires manual gating", operation)
            }
            LedgerError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            LedgerError::ArithmeticOverflow => write!(f, "Arithmetic overflow"),
            LedgerError::AssetTransfer(msg) => write!(f, "Asset transfer failed: {}", msg),
            LedgerError::Serialization(msg) => write!(f, "Serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_distinct() {
        let errors = vec![
            LedgerError::Unauthorized {
                caller: "x".to_string(),
            },
            LedgerError::PhaseViolation {
                operation: "mint",
                phase: Phase::Open,
            },
            LedgerError::InsufficientBalance {
                account: "x".to_string(),
                have: 1,
                need: 2,
            },
            LedgerError::InsufficientPool { have: 1, need: 2 },
            LedgerError::ArityMismatch {
                accounts: 1,
                amounts: 2,
            },
            LedgerError::IndexOutOfRange { index: 3, len: 3 },
            LedgerError::UnsupportedOperation { operation: "open" },
            LedgerError::InvalidConfig("bad".to_string()),
            LedgerError::ArithmeticOverflow,
            LedgerError::AssetTransfer("nope".to_string()),
            LedgerError::Serialization("eof".to_string()),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_display_phase_violation() {
        let e = LedgerError::PhaseViolation {
            operation: "vote",
            phase: Phase::PreOpen,
        };
        assert_eq!(
            e.to_string(),
            "vote is not allowed while the campaign is pre-open"
        );
    }
}
