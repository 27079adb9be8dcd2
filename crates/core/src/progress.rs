//! Per-user progress model.

use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::Time;

/// Cosmetic avatar variant chosen by the player.
///
/// Independent of progress and mutable at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarVariant {
    /// Female hunter avatar (the default)
    #[default]
    Female,
    /// Male hunter avatar
    Male,
}

impl AvatarVariant {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarVariant::Female => "female",
            AvatarVariant::Male => "male",
        }
    }
}

/// A player's progress through the quest sequence.
///
/// `unlocked_stages` counts fully completed stages; it doubles as the
/// 0-indexed position of the next stage to attempt. The record is created on
/// first session, advanced only by the progress engine, and deleted only by
/// an explicit admin reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    /// Identity of the player
    pub user_id: UserId,

    /// Human-readable label, defaulted at first creation
    pub display_name: String,

    /// Number of stages fully completed; invariant `0 <= n <= stage_count`
    pub unlocked_stages: u32,

    /// Chosen avatar
    #[serde(default)]
    pub avatar: AvatarVariant,

    /// Updated on session start and on every successful advance
    pub last_active_at: Time,

    /// Set when an admin redeems the reward coupon; the claim is only
    /// effective for the calendar day it occurred
    #[serde(default)]
    pub coupon_redeemed_at: Option<Time>,
}

impl UserProgress {
    /// Create a fresh record for a player's first session.
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            unlocked_stages: 0,
            avatar: AvatarVariant::default(),
            last_active_at: chrono::Utc::now(),
            coupon_redeemed_at: None,
        }
    }

    /// Whether the player has completed every stage of a catalog with
    /// `stage_count` stages.
    pub fn is_finished(&self, stage_count: usize) -> bool {
        stage_count > 0 && self.unlocked_stages as usize >= stage_count
    }

    /// Whether the coupon was already redeemed on the local calendar day
    /// containing `now`.
    pub fn coupon_claimed_on_day_of(&self, now: Time) -> bool {
        self.coupon_redeemed_at
            .is_some_and(|ts| same_local_day(ts, now))
    }
}

/// Whether two instants fall on the same local calendar day.
///
/// Redemption is "once per day" in venue-local time, so the comparison uses
/// the local zone rather than UTC.
pub fn same_local_day(a: Time, b: Time) -> bool {
    a.with_timezone(&chrono::Local).date_naive() == b.with_timezone(&chrono::Local).date_naive()
}

/// Answer of the redemption gate's eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStatus {
    /// True iff the player has completed every stage
    pub eligible: bool,

    /// True iff the coupon was already redeemed today; the reward screen
    /// renders in its "used" state without further admin action
    pub already_claimed_today: bool,
}
