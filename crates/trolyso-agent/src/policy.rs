//! What the assistant does when a step of the reply cycle fails.
//!
//! | Stage | Error | Policy |
//! |---|---|---|
//! | history read | `Memory` | continue with empty history |
//! | delivery of one part | `Channel` | log, keep going |
//! | persist | any | log only |
//! | anything else | any | one apology to the user |

use trolyso_core::error::TroLySoError;

/// Step of the reply cycle an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    HistoryRead,
    Backend,
    Delivery,
    Persist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Proceed without conversation history.
    DegradeHistory,
    /// Log the error and carry on with the cycle.
    LogAndContinue,
    /// Abort the cycle and send the fixed apology.
    Apologize,
}

impl FailurePolicy {
    pub fn for_failure(stage: Stage, err: &TroLySoError) -> Self {
        match (stage, err) {
            (Stage::HistoryRead, TroLySoError::Memory(_)) => FailurePolicy::DegradeHistory,
            (Stage::Delivery, TroLySoError::Channel(_)) => FailurePolicy::LogAndContinue,
            // The reply has already gone out by the time it is saved.
            (Stage::Persist, _) => FailurePolicy::LogAndContinue,
            _ => FailurePolicy::Apologize,
        }
    }
}
