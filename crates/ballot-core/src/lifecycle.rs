// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BALLOT - CAMPAIGN LIFECYCLE
//
// PreOpen → Open → Closed, never backwards.
// Two gating strategies, fixed per campaign:
// - Time:   phase derived from the block timestamp against [start, end)
// - Manual: owner fires open() then close(), each at most once, in order
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreOpen,
    Open,
    Closed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Phase::PreOpen => write!(f, "pre-open"),
            Phase::Open => write!(f, "open"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

/// Gating choice as written in a campaign config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Gating {
    Time { start_time: u64, end_time: u64 },
    Manual,
}

impl Gating {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Gating::Time {
                start_time,
                end_time,
            } if start_time >= end_time => Err(format!(
                "start_time ({}) must be before end_time ({})",
                start_time, end_time
            )),
            _ => Ok(()),
        }
    }
}

/// Read-only phase summary. For time gating `has_started`/`has_ended` track
/// the clock, for manual gating they mirror the opened/closed flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: Phase,
    pub has_started: bool,
    pub has_ended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Lifecycle {
    TimeGated {
        start_time: u64,
        end_time: u64,
        /// Highest phase any committed write has seen. A host replaying an
        /// older timestamp cannot pull the phase below this.
        observed: Phase,
    },
    ManualGated { opened: bool, closed: bool },
}

impl Lifecycle {
    pub fn new(gating: &Gating) -> Self {
        match gating {
            Gating::Time {
                start_time,
                end_time,
            } => Lifecycle::TimeGated {
                start_time: *start_time,
                end_time: *end_time,
                observed: Phase::PreOpen,
            },
            Gating::Manual => Lifecycle::ManualGated {
                opened: false,
                closed: false,
            },
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Lifecycle::ManualGated { .. })
    }

    /// Phase at `now` (seconds). Ignored by manual gating.
    pub fn phase_at(&self, now: u64) -> Phase {
        match self {
            Lifecycle::TimeGated {
                start_time,
                end_time,
                observed,
            } => {
                let derived = if now < *start_time {
                    Phase::PreOpen
                } else if now < *end_time {
                    Phase::Open
                } else {
                    Phase::Closed
                };
                derived.max(*observed)
            }
            Lifecycle::ManualGated { opened, closed } => match (opened, closed) {
                (_, true) => Phase::Closed,
                (true, false) => Phase::Open,
                (false, false) => Phase::PreOpen,
            },
        }
    }

    /// Remember a phase seen by a committed write.
    pub fn record(&mut self, phase: Phase) {
        if let Lifecycle::TimeGated { observed, .. } = self {
            if phase > *observed {
                *observed = phase;
            }
        }
    }

    pub fn has_started(&self, now: u64) -> bool {
        self.phase_at(now) >= Phase::Open
    }

    pub fn has_ended(&self, now: u64) -> bool {
        self.phase_at(now) == Phase::Closed
    }

    pub fn state(&self, now: u64) -> PhaseState {
        PhaseState {
            phase: self.phase_at(now),
            has_started: self.has_started(now),
            has_ended: self.has_ended(now),
        }
    }

    /// PreOpen → Open. Manual gating only; owner check is the caller's job.
    pub fn open(&mut self) -> Result<()> {
        match self {
            Lifecycle::TimeGated { .. } => {
                Err(LedgerError::UnsupportedOperation { operation: "open" })
            }
            Lifecycle::ManualGated { opened, closed } => {
                if *opened || *closed {
                    let phase = if *closed { Phase::Closed } else { Phase::Open };
                    return Err(LedgerError::PhaseViolation {
                        operation: "open",
                        phase,
                    });
                }
                *opened = true;
                Ok(())
            }
        }
    }

    /// Open → Closed. Manual gating only.
    pub fn close(&mut self) -> Result<()> {
        match self {
            Lifecycle::TimeGated { .. } => {
                Err(LedgerError::UnsupportedOperation { operation: "close" })
            }
            Lifecycle::ManualGated { opened, closed } => {
                if !*opened || *closed {
                    let phase = if *closed {
                        Phase::Closed
                    } else {
                        Phase::PreOpen
                    };
                    return Err(LedgerError::PhaseViolation {
                        operation: "close",
                        phase,
                    });
                }
                *closed = true;
                Ok(())
            }
        }
    }
}
