//! Progress engine - the stage-advance state machine.

use std::sync::Arc;

use chrono::Utc;
use questline_core::{AdvanceOutcome, AvatarVariant, UserId, UserProgress};
use questline_storage::Storage;
use tracing::{debug, warn};

use crate::catalog::load_catalog_checked;
use crate::EngineError;

/// Bounded optimistic retries for the conditional progress write.
pub(crate) const MAX_CAS_ATTEMPTS: usize = 3;

/// The sole authority for advancing a player's `unlocked_stages`.
///
/// State machine: the state is `unlocked_stages` in `[0, stage_count]`. The
/// only transition is `n -> n + 1`, taken when the attempted stage is
/// exactly `n` and the scanned code matches. Nothing here ever decreases
/// the count; only an external admin reset (record deletion) does.
#[derive(Clone)]
pub struct ProgressEngine {
    storage: Arc<dyn Storage>,
}

impl ProgressEngine {
    /// Create a progress engine over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Try to complete `stage_index` with a scanned payload.
    ///
    /// The index comes from the client's current view and is not trusted:
    /// the authoritative `unlocked_stages` is re-read at decision time and
    /// the committing write is a compare-and-swap keyed on it, so two
    /// near-simultaneous correct scans can never double-increment. Lost
    /// races are re-evaluated (the usual answer is `AlreadyCompleted`) with
    /// a bounded retry budget.
    pub async fn attempt_advance(
        &self,
        user: &UserId,
        stage_index: usize,
        scanned_code: &str,
    ) -> Result<AdvanceOutcome, EngineError> {
        let catalog = load_catalog_checked(self.storage.as_ref()).await?;

        let Some(stage) = catalog.stage(stage_index) else {
            debug!(user = %user, stage = stage_index, "attempt on unknown stage");
            return Ok(AdvanceOutcome::UnknownStage);
        };

        if !stage.matches(scanned_code) {
            debug!(user = %user, stage = stage_index, "wrong code scanned");
            return Ok(AdvanceOutcome::WrongCode);
        }

        let stage_index = stage_index as u32;
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let current = match self.storage.load_progress(user).await? {
                Some(progress) => progress,
                None => UserProgress::new(user.clone(), default_display_name(user)),
            };

            if stage_index < current.unlocked_stages {
                // Duplicate scan, back-navigation, or a race we lost; the
                // stage is already cleared and nothing must change.
                return Ok(AdvanceOutcome::AlreadyCompleted);
            }
            if stage_index > current.unlocked_stages {
                warn!(
                    user = %user,
                    attempted = stage_index,
                    unlocked = current.unlocked_stages,
                    "out-of-order stage attempt"
                );
                return Ok(AdvanceOutcome::OutOfOrder);
            }

            let mut updated = current;
            updated.unlocked_stages += 1;
            updated.last_active_at = Utc::now();

            if self
                .storage
                .compare_and_swap_progress(stage_index, &updated)
                .await?
            {
                debug!(
                    user = %user,
                    unlocked = updated.unlocked_stages,
                    "stage advanced"
                );
                return Ok(AdvanceOutcome::Advanced(updated.unlocked_stages));
            }
            debug!(user = %user, attempt, "conditional progress write lost, re-reading");
        }
        Err(EngineError::Contention)
    }

    /// Start a session: create the progress record on first login, refresh
    /// `last_active_at` otherwise.
    ///
    /// Committed through the same conditional write as stage advancement:
    /// a session refresh racing a scan on another device must never write
    /// back a stale `unlocked_stages`.
    pub async fn begin_session(
        &self,
        user: &UserId,
        display_name: Option<&str>,
    ) -> Result<UserProgress, EngineError> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let mut progress = match self.storage.load_progress(user).await? {
                Some(progress) => progress,
                None => {
                    let name = display_name
                        .map(str::to_string)
                        .unwrap_or_else(|| default_display_name(user));
                    debug!(user = %user, "creating progress record on first session");
                    UserProgress::new(user.clone(), name)
                }
            };
            let observed = progress.unlocked_stages;
            progress.last_active_at = Utc::now();
            if self
                .storage
                .compare_and_swap_progress(observed, &progress)
                .await?
            {
                return Ok(progress);
            }
            debug!(user = %user, attempt, "session write lost a race, re-reading");
        }
        Err(EngineError::Contention)
    }

    /// Change the player's cosmetic avatar; independent of progress.
    pub async fn set_avatar(
        &self,
        user: &UserId,
        avatar: AvatarVariant,
    ) -> Result<UserProgress, EngineError> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let mut progress = match self.storage.load_progress(user).await? {
                Some(progress) => progress,
                None => UserProgress::new(user.clone(), default_display_name(user)),
            };
            let observed = progress.unlocked_stages;
            progress.avatar = avatar;
            if self
                .storage
                .compare_and_swap_progress(observed, &progress)
                .await?
            {
                return Ok(progress);
            }
            debug!(user = %user, attempt, "avatar write lost a race, re-reading");
        }
        Err(EngineError::Contention)
    }
}

/// Display name used when the identity layer provides none.
pub(crate) fn default_display_name(user: &UserId) -> String {
    let prefix: String = user.as_str().chars().take(5).collect();
    format!("explorer-{prefix}")
}
