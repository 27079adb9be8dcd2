//! Typed outcomes of the core game operations.
//!
//! Expected game conditions (wrong code, duplicate scan, invalid admin
//! code, ...) are success variants, not errors: callers branch on them to
//! drive the UI, and none of them aborts the operation pipeline.

use crate::Time;

/// Result of a stage-advance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The scan was correct and in order; carries the new unlocked count.
    /// The only variant that mutated state.
    Advanced(u32),

    /// The attempted stage was already completed (duplicate scan,
    /// back-navigation, or a lost race). Idempotent no-op; the UI proceeds
    /// as success.
    AlreadyCompleted,

    /// The attempted stage is ahead of the player's progress. Defended
    /// against direct calls; no mutation.
    OutOfOrder,

    /// The scanned payload does not match the stage's secret code.
    /// Recoverable; immediate retry allowed.
    WrongCode,

    /// No stage exists at the attempted index.
    UnknownStage,
}

/// Result of a coupon redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The admin code matched and the coupon was marked used at this
    /// instant.
    Redeemed(Time),

    /// The coupon was already redeemed earlier the same day; carries the
    /// original timestamp, which is left unchanged.
    AlreadyRedeemed(Time),

    /// The entered code does not match the catalog's admin code.
    /// Recoverable; no mutation.
    InvalidCode,
}

impl AdvanceOutcome {
    /// Whether the attempt left the player at or past the attempted stage,
    /// i.e. the UI should show the stage as cleared.
    pub fn is_cleared(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced(_) | AdvanceOutcome::AlreadyCompleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_scans_count_as_cleared() {
        assert!(AdvanceOutcome::Advanced(3).is_cleared());
        assert!(AdvanceOutcome::AlreadyCompleted.is_cleared());
        assert!(!AdvanceOutcome::OutOfOrder.is_cleared());
        assert!(!AdvanceOutcome::WrongCode.is_cleared());
        assert!(!AdvanceOutcome::UnknownStage.is_cleared());
    }
}
