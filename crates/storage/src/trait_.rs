//! Storage trait abstraction.

use async_trait::async_trait;
use questline_core::{AdminEntry, CatalogError, QuestCatalog, UserId, UserProgress};
use tokio::sync::watch;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted catalog document failed validation or migration
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for Questline data.
///
/// Receivers are `&self` so a backend can be shared via `Arc` across
/// concurrent player sessions; backends use interior locking.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Catalog (singleton `config` record) ===

    /// Load the quest catalog, `None` if never configured.
    async fn load_catalog(&self) -> Result<Option<QuestCatalog>>;

    /// Save the quest catalog wholesale (last-writer-wins).
    async fn save_catalog(&self, catalog: &QuestCatalog) -> Result<()>;

    // === User progress (`user_progress/{id}`) ===

    /// Load a player's progress record.
    async fn load_progress(&self, user: &UserId) -> Result<Option<UserProgress>>;

    /// Save a player's progress record unconditionally.
    async fn save_progress(&self, progress: &UserProgress) -> Result<()>;

    /// Write `updated` only if the stored record's `unlocked_stages` still
    /// equals `expected_stages` (a missing record counts as 0).
    ///
    /// `Ok(false)` signals a lost race: another writer got in between the
    /// caller's read and this write. The check and the write are atomic with
    /// respect to every other progress mutation on this backend.
    async fn compare_and_swap_progress(
        &self,
        expected_stages: u32,
        updated: &UserProgress,
    ) -> Result<bool>;

    /// Delete a player's progress record (admin reset). Deleting a missing
    /// record is not an error.
    async fn delete_progress(&self, user: &UserId) -> Result<()>;

    /// List all progress records.
    async fn list_progress(&self) -> Result<Vec<UserProgress>>;

    /// Subscribe to live updates of one player's record.
    ///
    /// The receiver observes the record as of subscription time and every
    /// subsequent save or delete (`None` after deletion).
    async fn subscribe_progress(&self, user: &UserId) -> watch::Receiver<Option<UserProgress>>;

    // === Admin allow-list (`admins/{key}`) ===

    /// List all admin entries.
    async fn list_admins(&self) -> Result<Vec<AdminEntry>>;

    /// Save an admin entry.
    async fn save_admin(&self, entry: &AdminEntry) -> Result<()>;
}
