//! In-memory storage implementation.
//!
//! Reference semantics for the storage contract, used by engine tests and
//! single-process deployments. One mutex guards the whole state, which makes
//! the compare-and-swap primitive trivially atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use questline_core::{AdminEntry, QuestCatalog, UserId, UserProgress};
use tokio::sync::{watch, Mutex};

use crate::notify::ProgressChannels;
use crate::{Result, Storage};

#[derive(Default)]
struct State {
    catalog: Option<QuestCatalog>,
    progress: HashMap<UserId, UserProgress>,
    admins: HashMap<String, AdminEntry>,
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    channels: ProgressChannels,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_catalog(&self) -> Result<Option<QuestCatalog>> {
        Ok(self.state.lock().await.catalog.clone())
    }

    async fn save_catalog(&self, catalog: &QuestCatalog) -> Result<()> {
        self.state.lock().await.catalog = Some(catalog.clone());
        Ok(())
    }

    async fn load_progress(&self, user: &UserId) -> Result<Option<UserProgress>> {
        Ok(self.state.lock().await.progress.get(user).cloned())
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        // Publish under the state lock so watch values land in commit order.
        let mut state = self.state.lock().await;
        state
            .progress
            .insert(progress.user_id.clone(), progress.clone());
        self.channels
            .publish(&progress.user_id, Some(progress.clone()));
        Ok(())
    }

    async fn compare_and_swap_progress(
        &self,
        expected_stages: u32,
        updated: &UserProgress,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let current = state
            .progress
            .get(&updated.user_id)
            .map(|p| p.unlocked_stages)
            .unwrap_or(0);
        if current != expected_stages {
            return Ok(false);
        }
        state
            .progress
            .insert(updated.user_id.clone(), updated.clone());
        self.channels
            .publish(&updated.user_id, Some(updated.clone()));
        Ok(true)
    }

    async fn delete_progress(&self, user: &UserId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.progress.remove(user);
        self.channels.publish(user, None);
        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<UserProgress>> {
        let mut records: Vec<_> = self.state.lock().await.progress.values().cloned().collect();
        records.sort_by(|a, b| a.user_id.as_str().cmp(b.user_id.as_str()));
        Ok(records)
    }

    async fn subscribe_progress(&self, user: &UserId) -> watch::Receiver<Option<UserProgress>> {
        let current = self.state.lock().await.progress.get(user).cloned();
        self.channels.subscribe(user, current)
    }

    async fn list_admins(&self) -> Result<Vec<AdminEntry>> {
        let mut entries: Vec<_> = self.state.lock().await.admins.values().cloned().collect();
        entries.sort_by(|a, b| a.key.to_string().cmp(&b.key.to_string()));
        Ok(entries)
    }

    async fn save_admin(&self, entry: &AdminEntry) -> Result<()> {
        self.state
            .lock()
            .await
            .admins
            .insert(entry.key.to_string(), entry.clone());
        Ok(())
    }
}
