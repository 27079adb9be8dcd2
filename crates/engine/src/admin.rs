//! Admin allow-list registry.

use std::sync::Arc;

use questline_core::AdminEntry;
use questline_storage::Storage;
use tracing::info;

use crate::EngineError;

/// Answers "is this identity an admin?" from the persisted allow-list.
///
/// The registry is a capability check only; authentication happens in the
/// external identity layer and callers pass the already-verified identity.
#[derive(Clone)]
pub struct AdminRegistry {
    storage: Arc<dyn Storage>,
}

impl AdminRegistry {
    /// Create a registry over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Whether the identity appears in the allow-list.
    pub async fn is_admin(&self, identity_id: &str) -> Result<bool, EngineError> {
        let admins = self.storage.list_admins().await?;
        Ok(admins.iter().any(|entry| entry.identity_id == identity_id))
    }

    /// Add an identity to the allow-list.
    pub async fn grant(
        &self,
        identity_id: &str,
        name: &str,
    ) -> Result<AdminEntry, EngineError> {
        let entry = AdminEntry::new(identity_id, name);
        self.storage.save_admin(&entry).await?;
        info!(identity = identity_id, "admin access granted");
        Ok(entry)
    }

    /// List all allow-list entries.
    pub async fn list(&self) -> Result<Vec<AdminEntry>, EngineError> {
        Ok(self.storage.list_admins().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_storage::MemoryStorage;

    #[tokio::test]
    async fn membership_is_the_only_signal() {
        let registry = AdminRegistry::new(Arc::new(MemoryStorage::new()));
        assert!(!registry.is_admin("kakao:1234").await.unwrap());

        registry.grant("kakao:1234", "Staff Kim").await.unwrap();
        assert!(registry.is_admin("kakao:1234").await.unwrap());
        assert!(!registry.is_admin("kakao:5678").await.unwrap());
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }
}
