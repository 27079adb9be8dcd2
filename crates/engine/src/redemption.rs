//! Redemption gate - coupon eligibility and admin-code redemption.

use std::sync::Arc;

use chrono::Utc;
use questline_core::{CompletionStatus, RedeemOutcome, UserId, UserProgress};
use questline_storage::Storage;
use tracing::{debug, info};

use crate::catalog::load_catalog_checked;
use crate::engine::{default_display_name, MAX_CAS_ATTEMPTS};
use crate::EngineError;

/// Gates the reward coupon behind an admin-entered secret, once per player
/// per local calendar day, after the terminal progress state is reached.
#[derive(Clone)]
pub struct RedemptionGate {
    storage: Arc<dyn Storage>,
}

impl RedemptionGate {
    /// Create a redemption gate over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Whether the player may see the coupon screen, and whether today's
    /// coupon is already spent.
    ///
    /// Callers must route ineligible players back to the quest flow instead
    /// of showing the coupon.
    pub async fn validate_completion(
        &self,
        user: &UserId,
    ) -> Result<CompletionStatus, EngineError> {
        let catalog = load_catalog_checked(self.storage.as_ref()).await?;
        let progress = self.storage.load_progress(user).await?;

        let status = match progress {
            Some(progress) => CompletionStatus {
                eligible: progress.is_finished(catalog.stage_count),
                already_claimed_today: progress.coupon_claimed_on_day_of(Utc::now()),
            },
            None => CompletionStatus {
                eligible: false,
                already_claimed_today: false,
            },
        };
        Ok(status)
    }

    /// Redeem the coupon with an admin-entered code.
    ///
    /// The code comparison is exact (no trimming or case folding, unlike
    /// stage codes). A match marks the coupon used at this instant; a
    /// same-day repeat is an idempotent no-op carrying the original
    /// timestamp. A claim from an earlier day does not block today's;
    /// one reward per visit-day.
    ///
    /// The timestamp write goes through the conditional progress write so a
    /// redemption racing a scan cannot roll `unlocked_stages` back; the
    /// same-day check is re-evaluated on every retry.
    pub async fn redeem(
        &self,
        user: &UserId,
        entered_code: &str,
    ) -> Result<RedeemOutcome, EngineError> {
        let catalog = load_catalog_checked(self.storage.as_ref()).await?;

        if entered_code != catalog.admin_code {
            debug!(user = %user, "invalid admin code entered");
            return Ok(RedeemOutcome::InvalidCode);
        }

        for attempt in 0..MAX_CAS_ATTEMPTS {
            let mut progress = match self.storage.load_progress(user).await? {
                Some(progress) => progress,
                None => UserProgress::new(user.clone(), default_display_name(user)),
            };

            let now = Utc::now();
            if let Some(ts) = progress.coupon_redeemed_at {
                if questline_core::same_local_day(ts, now) {
                    return Ok(RedeemOutcome::AlreadyRedeemed(ts));
                }
            }

            let observed = progress.unlocked_stages;
            progress.coupon_redeemed_at = Some(now);
            if self
                .storage
                .compare_and_swap_progress(observed, &progress)
                .await?
            {
                info!(user = %user, "coupon redeemed");
                return Ok(RedeemOutcome::Redeemed(now));
            }
            debug!(user = %user, attempt, "redemption write lost a race, re-reading");
        }
        Err(EngineError::Contention)
    }
}
