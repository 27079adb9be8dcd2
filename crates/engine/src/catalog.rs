//! Catalog access and admin-side mutation.

use std::sync::Arc;

use questline_core::QuestCatalog;
use questline_storage::Storage;
use tracing::{info, warn};

use crate::EngineError;

/// Load the catalog and refuse to hand out a structurally broken one.
///
/// Player-facing operations read the catalog fresh at call time through
/// this check rather than caching it, so admin edits take effect on the
/// next scan.
pub(crate) async fn load_catalog_checked(
    storage: &dyn Storage,
) -> Result<QuestCatalog, EngineError> {
    let catalog = storage
        .load_catalog()
        .await?
        .ok_or_else(|| EngineError::CorruptCatalog("no catalog has been configured".to_string()))?;
    if catalog.stage_count == 0 {
        return Err(EngineError::CorruptCatalog(
            "stage count is zero".to_string(),
        ));
    }
    if catalog.stages.len() < catalog.stage_count {
        return Err(EngineError::CorruptCatalog(format!(
            "{} stages configured but only {} defined",
            catalog.stage_count,
            catalog.stages.len()
        )));
    }
    Ok(catalog)
}

/// Admin-side catalog store: load-or-init with defaults and validated
/// saves.
///
/// Catalog writes are wholesale and last-writer-wins; the admin set is
/// small and trusted, so no optimistic concurrency control is applied.
#[derive(Clone)]
pub struct CatalogStore {
    storage: Arc<dyn Storage>,
}

impl CatalogStore {
    /// Create a catalog store over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load the catalog, creating and persisting the default one on first
    /// access.
    pub async fn load_or_init(&self) -> Result<QuestCatalog, EngineError> {
        if let Some(catalog) = self.storage.load_catalog().await? {
            return Ok(catalog);
        }
        let catalog = QuestCatalog::default();
        self.storage.save_catalog(&catalog).await?;
        info!("initialized default quest catalog ({} stages)", catalog.stage_count);
        Ok(catalog)
    }

    /// Persist a wholesale admin save.
    ///
    /// Rejects structural inconsistencies and any playable stage with an
    /// empty secret code, so a published catalog never contains an
    /// unsolvable stage.
    pub async fn save(&self, catalog: &QuestCatalog) -> Result<(), EngineError> {
        catalog.validate()?;
        catalog.validate_codes()?;
        self.storage.save_catalog(catalog).await?;
        info!("catalog saved ({} stages)", catalog.stage_count);
        Ok(())
    }

    /// Change the stage count, truncating or appending placeholder stages.
    ///
    /// The resized catalog is persisted immediately so the stage list and
    /// count never disagree; appended placeholders are unsolvable until an
    /// admin fills in their codes via [`set_stage`](Self::set_stage).
    pub async fn resize(&self, new_count: usize) -> Result<QuestCatalog, EngineError> {
        if new_count == 0 {
            return Err(EngineError::Catalog(
                questline_core::CatalogError::ZeroStages,
            ));
        }
        let catalog = self.load_or_init().await?.resized(new_count);
        catalog.validate()?;
        self.storage.save_catalog(&catalog).await?;
        if catalog.validate_codes().is_err() {
            warn!(
                stage_count = catalog.stage_count,
                "catalog has placeholder stages without secret codes"
            );
        }
        Ok(catalog)
    }

    /// Update one stage's content in place.
    pub async fn set_stage(
        &self,
        index: usize,
        description: Option<&str>,
        secret_code: Option<&str>,
    ) -> Result<QuestCatalog, EngineError> {
        let mut catalog = self.load_or_init().await?;
        let stage_count = catalog.stage_count;
        let Some(stage) = catalog.stages.get_mut(index).filter(|_| index < stage_count)
        else {
            return Err(EngineError::CorruptCatalog(format!(
                "no stage at index {index}"
            )));
        };
        if let Some(description) = description {
            stage.description = description.to_string();
        }
        if let Some(code) = secret_code {
            stage.secret_code = code.to_string();
        }
        catalog.validate()?;
        self.storage.save_catalog(&catalog).await?;
        if catalog.validate_codes().is_err() {
            warn!("catalog still has stages without secret codes");
        }
        Ok(catalog)
    }

    /// Replace the global settings (codes and coupon text), leaving stages
    /// untouched. `None` keeps the current value.
    pub async fn set_settings(
        &self,
        admin_code: Option<&str>,
        start_code: Option<&str>,
        coupon_title: Option<&str>,
        coupon_subtitle: Option<&str>,
    ) -> Result<QuestCatalog, EngineError> {
        let mut catalog = self.load_or_init().await?;
        if let Some(code) = admin_code {
            catalog.admin_code = code.to_string();
        }
        if let Some(code) = start_code {
            catalog.start_code = code.to_string();
        }
        if let Some(title) = coupon_title {
            catalog.coupon_title = title.to_string();
        }
        if let Some(subtitle) = coupon_subtitle {
            catalog.coupon_subtitle = subtitle.to_string();
        }
        self.save(&catalog).await?;
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_core::CatalogError;
    use questline_storage::MemoryStorage;

    fn store() -> CatalogStore {
        CatalogStore::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn load_or_init_persists_defaults_once() {
        let store = store();
        let first = store.load_or_init().await.unwrap();
        assert_eq!(first.stage_count, 5);

        // Second load returns the persisted record, not a fresh default.
        let again = store.load_or_init().await.unwrap();
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn save_rejects_empty_secret_code() {
        let store = store();
        let mut catalog = store.load_or_init().await.unwrap();
        catalog.stages[1].secret_code = String::new();
        assert!(matches!(
            store.save(&catalog).await,
            Err(EngineError::Catalog(CatalogError::EmptySecretCode(1)))
        ));
    }

    #[tokio::test]
    async fn save_rejects_count_mismatch() {
        let store = store();
        let mut catalog = store.load_or_init().await.unwrap();
        catalog.stage_count = 7;
        assert!(matches!(
            store.save(&catalog).await,
            Err(EngineError::Catalog(CatalogError::StageCountMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn resize_grow_then_fill() {
        let store = store();
        let grown = store.resize(7).await.unwrap();
        assert_eq!(grown.stages.len(), 7);
        assert_eq!(grown.stages[0].secret_code, "OAKTREEQUEST");
        assert!(grown.stages[6].secret_code.is_empty());

        let filled = store
            .set_stage(6, Some("Find the hidden cave."), Some("HIDDENCAVE"))
            .await
            .unwrap();
        assert_eq!(filled.stages[6].secret_code, "HIDDENCAVE");
    }

    #[tokio::test]
    async fn resize_to_zero_is_rejected() {
        let store = store();
        assert!(matches!(
            store.resize(0).await,
            Err(EngineError::Catalog(CatalogError::ZeroStages))
        ));
    }

    #[tokio::test]
    async fn set_stage_out_of_range_fails() {
        let store = store();
        store.load_or_init().await.unwrap();
        assert!(store.set_stage(9, None, Some("X")).await.is_err());
    }

    #[tokio::test]
    async fn set_settings_updates_codes() {
        let store = store();
        let catalog = store
            .set_settings(Some("STAFFONLY"), Some("WELCOME"), None, None)
            .await
            .unwrap();
        assert_eq!(catalog.admin_code, "STAFFONLY");
        assert_eq!(catalog.start_code, "WELCOME");
        assert_eq!(catalog.coupon_title, "Special Reward Coupon");
    }
}
