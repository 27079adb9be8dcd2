//! JSON file storage implementation.
//!
//! Stores each keyspace as JSON files under a data directory:
//!
//! ```text
//! <root>/config.json            quest catalog (singleton)
//! <root>/user_progress/<id>.json
//! <root>/admins/<key>.json
//! ```
//!
//! Every mutation is serialized through one internal lock, which makes the
//! compare-and-swap primitive atomic within the process. The deployment
//! assumption is a single writer process per data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use questline_core::{AdminEntry, QuestCatalog, UserId, UserProgress};
use tokio::fs;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::notify::ProgressChannels;
use crate::{Result, Storage, StorageError};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
    channels: ProgressChannels,
}

impl JsonStorage {
    /// Open storage at `root`, creating the keyspace directories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("user_progress")).await?;
        fs::create_dir_all(root.join("admins")).await?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            channels: ProgressChannels::default(),
        })
    }

    fn catalog_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    fn progress_path(&self, user: &UserId) -> Result<PathBuf> {
        // The id becomes a file name; refuse anything that could walk out
        // of the data directory.
        let id = user.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(StorageError::Other(format!(
                "user id not usable as a file name: {id:?}"
            )));
        }
        Ok(self.root.join("user_progress").join(format!("{id}.json")))
    }

    fn admin_path(&self, entry: &AdminEntry) -> PathBuf {
        self.root.join("admins").join(format!("{}.json", entry.key))
    }

    async fn read_progress_file(&self, user: &UserId) -> Result<Option<UserProgress>> {
        match fs::read_to_string(self.progress_path(user)?).await {
            Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_progress_file(&self, progress: &UserProgress) -> Result<()> {
        let path = self.progress_path(&progress.user_id)?;
        fs::write(&path, serde_json::to_string_pretty(progress)?).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn load_catalog(&self) -> Result<Option<QuestCatalog>> {
        match fs::read_to_string(self.catalog_path()).await {
            Ok(s) => {
                // Decode through the migration step so documents written by
                // earlier revisions keep loading.
                let value: serde_json::Value = serde_json::from_str(&s)?;
                Ok(Some(QuestCatalog::from_value(value)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_catalog(&self, catalog: &QuestCatalog) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        fs::write(
            self.catalog_path(),
            serde_json::to_string_pretty(catalog)?,
        )
        .await?;
        debug!("catalog saved ({} stages)", catalog.stage_count);
        Ok(())
    }

    async fn load_progress(&self, user: &UserId) -> Result<Option<UserProgress>> {
        self.read_progress_file(user).await
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_progress_file(progress).await?;
        self.channels
            .publish(&progress.user_id, Some(progress.clone()));
        Ok(())
    }

    async fn compare_and_swap_progress(
        &self,
        expected_stages: u32,
        updated: &UserProgress,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let current = self
            .read_progress_file(&updated.user_id)
            .await?
            .map(|p| p.unlocked_stages)
            .unwrap_or(0);
        if current != expected_stages {
            debug!(
                user = %updated.user_id,
                expected = expected_stages,
                found = current,
                "progress swap lost a race"
            );
            return Ok(false);
        }
        self.write_progress_file(updated).await?;
        self.channels
            .publish(&updated.user_id, Some(updated.clone()));
        Ok(true)
    }

    async fn delete_progress(&self, user: &UserId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.progress_path(user)?).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.channels.publish(user, None);
        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<UserProgress>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(self.root.join("user_progress")).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|e| e == "json") {
                let s = fs::read_to_string(entry.path()).await?;
                records.push(serde_json::from_str(&s)?);
            }
        }
        records.sort_by(|a: &UserProgress, b: &UserProgress| {
            a.user_id.as_str().cmp(b.user_id.as_str())
        });
        Ok(records)
    }

    async fn subscribe_progress(&self, user: &UserId) -> watch::Receiver<Option<UserProgress>> {
        let current = match self.read_progress_file(user).await {
            Ok(current) => current,
            Err(e) => {
                warn!(user = %user, error = %e, "seeding subscription without stored record");
                None
            }
        };
        self.channels.subscribe(user, current)
    }

    async fn list_admins(&self) -> Result<Vec<AdminEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(self.root.join("admins")).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.path().extension().is_some_and(|e| e == "json") {
                let s = fs::read_to_string(entry.path()).await?;
                entries.push(serde_json::from_str(&s)?);
            }
        }
        entries.sort_by(|a: &AdminEntry, b: &AdminEntry| {
            a.key.to_string().cmp(&b.key.to_string())
        });
        Ok(entries)
    }

    async fn save_admin(&self, entry: &AdminEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        fs::write(self.admin_path(entry), serde_json::to_string_pretty(entry)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, JsonStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn catalog_round_trip() {
        let (_dir, storage) = open_temp().await;
        assert!(storage.load_catalog().await.unwrap().is_none());

        let catalog = QuestCatalog::default();
        storage.save_catalog(&catalog).await.unwrap();
        assert_eq!(storage.load_catalog().await.unwrap(), Some(catalog));
    }

    #[tokio::test]
    async fn legacy_catalog_document_loads() {
        let (dir, storage) = open_temp().await;
        let legacy = serde_json::json!({
            "gameStartCode": "WELCOME2024",
            "quests": [
                { "description": "Scan the oak tree.", "qrCode": "OAKTREEQUEST" },
            ],
        });
        std::fs::write(
            dir.path().join("config.json"),
            serde_json::to_string(&legacy).unwrap(),
        )
        .unwrap();

        let catalog = storage.load_catalog().await.unwrap().unwrap();
        assert_eq!(catalog.stage_count, 1);
        assert_eq!(catalog.stages[0].secret_code, "OAKTREEQUEST");
        assert_eq!(catalog.start_code, "WELCOME2024");
    }

    #[tokio::test]
    async fn progress_save_load_delete() {
        let (_dir, storage) = open_temp().await;
        let user = UserId::new("uid-1");
        let progress = UserProgress::new(user.clone(), "Explorer Alice");

        storage.save_progress(&progress).await.unwrap();
        assert_eq!(
            storage.load_progress(&user).await.unwrap(),
            Some(progress.clone())
        );

        storage.delete_progress(&user).await.unwrap();
        assert!(storage.load_progress(&user).await.unwrap().is_none());

        // Deleting again is a no-op, not an error.
        storage.delete_progress(&user).await.unwrap();
    }

    #[tokio::test]
    async fn cas_checks_stored_count() {
        let (_dir, storage) = open_temp().await;
        let user = UserId::new("uid-1");

        let mut progress = UserProgress::new(user.clone(), "Explorer Alice");
        progress.unlocked_stages = 1;

        assert!(storage
            .compare_and_swap_progress(0, &progress)
            .await
            .unwrap());
        assert!(!storage
            .compare_and_swap_progress(0, &progress)
            .await
            .unwrap());

        let stored = storage.load_progress(&user).await.unwrap().unwrap();
        assert_eq!(stored.unlocked_stages, 1);
    }

    #[tokio::test]
    async fn list_progress_returns_all_records() {
        let (_dir, storage) = open_temp().await;
        for id in ["uid-b", "uid-a", "uid-c"] {
            let progress = UserProgress::new(UserId::new(id), id);
            storage.save_progress(&progress).await.unwrap();
        }
        let records = storage.list_progress().await.unwrap();
        let ids: Vec<_> = records.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["uid-a", "uid-b", "uid-c"]);
    }

    #[tokio::test]
    async fn admins_round_trip() {
        let (_dir, storage) = open_temp().await;
        let entry = AdminEntry::new("kakao:1234", "Staff Kim");
        storage.save_admin(&entry).await.unwrap();
        assert_eq!(storage.list_admins().await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn path_escaping_user_ids_are_refused() {
        let (dir, storage) = open_temp().await;

        for id in ["../outside", "a/b", "a\\b", ""] {
            let progress = UserProgress::new(UserId::new(id), "Explorer Alice");
            assert!(
                storage.save_progress(&progress).await.is_err(),
                "id {id:?} must be refused"
            );
            assert!(storage.load_progress(&UserId::new(id)).await.is_err());
        }

        // Nothing landed outside the progress directory.
        assert!(!dir.path().join("../outside.json").exists());
    }

    #[tokio::test]
    async fn unreadable_record_seeds_subscription_empty() {
        let (dir, storage) = open_temp().await;
        let user = UserId::new("uid-1");
        std::fs::write(
            dir.path().join("user_progress").join("uid-1.json"),
            "{ not json",
        )
        .unwrap();

        let rx = storage.subscribe_progress(&user).await;
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn subscriber_sees_saves() {
        let (_dir, storage) = open_temp().await;
        let user = UserId::new("uid-1");

        let mut rx = storage.subscribe_progress(&user).await;
        assert!(rx.borrow().is_none());

        let progress = UserProgress::new(user.clone(), "Explorer Alice");
        storage.save_progress(&progress).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&progress));
    }
}
