//! Quest catalog model - admin-configured stage definitions and game settings.
//!
//! The catalog is a single global record. It is created with defaults on
//! first access, mutated wholesale by admin saves, and never deleted.
//! Earlier revisions of the game persisted the record under drifting field
//! spellings; loading goes through a versioned migration step
//! ([`QuestCatalog::from_value`]) instead of ad-hoc fallbacks at call sites.

use serde::{Deserialize, Serialize};

/// Catalog schema version written by this build.
pub const CATALOG_SCHEMA_VERSION: u32 = 1;

/// Errors from catalog validation and migration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Stage count must be at least one.
    #[error("stage count must be at least 1")]
    ZeroStages,

    /// Stage list length disagrees with the configured count.
    #[error("catalog defines {actual} stages but stage count is {expected}")]
    StageCountMismatch {
        /// Configured stage count.
        expected: usize,
        /// Number of stage entries actually present.
        actual: usize,
    },

    /// A stage within the configured count has no secret code.
    #[error("stage {0} has an empty secret code")]
    EmptySecretCode(usize),

    /// The persisted document is newer than this build understands.
    #[error("unsupported catalog schema version {0}")]
    UnsupportedVersion(u32),

    /// The persisted document could not be decoded at all.
    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Normalize a stage code for comparison: surrounding whitespace is
/// insignificant and matching is case-insensitive.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// One unit of the quest sequence, identified by its position in the
/// catalog's stage list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StageDefinition {
    /// Quest text shown to the player
    #[serde(default)]
    pub description: String,

    /// Payload expected from the QR scan for this stage
    #[serde(default, alias = "qrCode", alias = "secretCode")]
    pub secret_code: String,
}

impl StageDefinition {
    /// Create a stage definition.
    pub fn new(description: impl Into<String>, secret_code: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            secret_code: secret_code.into(),
        }
    }

    /// Whether a scanned payload matches this stage's secret code.
    ///
    /// A stage whose code is empty after normalization matches nothing, so a
    /// placeholder stage can never be completed by scanning an empty string.
    pub fn matches(&self, scanned: &str) -> bool {
        let secret = normalize_code(&self.secret_code);
        !secret.is_empty() && normalize_code(scanned) == secret
    }
}

/// The admin-configured set of stage definitions and global game settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestCatalog {
    /// Schema version of the persisted document
    #[serde(default)]
    pub schema_version: u32,

    /// Number of stages in play
    #[serde(default, alias = "stageCount")]
    pub stage_count: usize,

    /// Ordered stage definitions; `stages[i]` is the stage at index `i`
    #[serde(default, alias = "quests")]
    pub stages: Vec<StageDefinition>,

    /// Coupon headline shown on the reward screen
    #[serde(default = "default_coupon_title", alias = "couponTitle")]
    pub coupon_title: String,

    /// Coupon sub-line shown on the reward screen
    #[serde(default = "default_coupon_subtitle", alias = "couponSubtitle")]
    pub coupon_subtitle: String,

    /// Shared secret an admin enters to redeem a coupon (exact match)
    #[serde(default = "default_admin_code", alias = "adminCode")]
    pub admin_code: String,

    /// Shared secret gating initial access to login
    #[serde(default = "default_start_code", alias = "gameStartCode", alias = "startCode")]
    pub start_code: String,
}

fn default_coupon_title() -> String {
    "Special Reward Coupon".to_string()
}

fn default_coupon_subtitle() -> String {
    "Thank you for completing the adventure!".to_string()
}

fn default_admin_code() -> String {
    "DISABLE".to_string()
}

fn default_start_code() -> String {
    "DISCOVERS".to_string()
}

impl Default for QuestCatalog {
    /// The stock five-stage hunt used until an admin configures the game.
    fn default() -> Self {
        let stages = vec![
            StageDefinition::new(
                "The first piece of the puzzle is hidden. Scan the code on the old oak tree.",
                "OAKTREEQUEST",
            ),
            StageDefinition::new(
                "Your compass points to a secret. Find the next clue near the sundial.",
                "SUNDIALSECRET",
            ),
            StageDefinition::new(
                "A beautiful view holds a key. Scan the plaque at the scenic overlook.",
                "SCENICVIEWKEY",
            ),
            StageDefinition::new(
                "Listen to the trees. The next step is hidden among the tallest pines.",
                "TALLESTPINE",
            ),
            StageDefinition::new(
                "The story concludes here. Find the final QR code on the last page of the storybook.",
                "FINALCHAPTER",
            ),
        ];
        Self {
            schema_version: CATALOG_SCHEMA_VERSION,
            stage_count: stages.len(),
            stages,
            coupon_title: default_coupon_title(),
            coupon_subtitle: default_coupon_subtitle(),
            admin_code: default_admin_code(),
            start_code: default_start_code(),
        }
    }
}

impl QuestCatalog {
    /// The stage at `index`, if it exists within the configured count.
    ///
    /// Entries beyond `stage_count` are never playable even if the stored
    /// list happens to be longer.
    pub fn stage(&self, index: usize) -> Option<&StageDefinition> {
        if index < self.stage_count {
            self.stages.get(index)
        } else {
            None
        }
    }

    /// Decode a persisted catalog document, migrating legacy shapes.
    ///
    /// Field spellings from earlier revisions (`quests`, `qrCode`,
    /// `gameStartCode`, ...) are accepted, missing fields take defaults, and
    /// a missing stage count is inferred from the stage list. Documents
    /// written by a newer schema are refused rather than partially decoded.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CatalogError> {
        let version = value
            .get("schema_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        if version > CATALOG_SCHEMA_VERSION {
            return Err(CatalogError::UnsupportedVersion(version));
        }

        let mut catalog: QuestCatalog = serde_json::from_value(value)?;
        catalog.schema_version = CATALOG_SCHEMA_VERSION;
        if catalog.stage_count == 0 {
            catalog.stage_count = catalog.stages.len();
        }
        Ok(catalog)
    }

    /// Resize the stage list to `new_count`, preserving entries by index.
    ///
    /// Shrinking truncates; growing appends empty placeholder stages that an
    /// admin is expected to fill in before players reach them.
    pub fn resized(mut self, new_count: usize) -> Self {
        self.stage_count = new_count;
        if self.stages.len() > new_count {
            self.stages.truncate(new_count);
        } else {
            self.stages
                .resize_with(new_count, StageDefinition::default);
        }
        self
    }

    /// Check the structural invariant: at least one stage, and exactly
    /// `stage_count` entries in the stage list.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.stage_count == 0 {
            return Err(CatalogError::ZeroStages);
        }
        if self.stages.len() != self.stage_count {
            return Err(CatalogError::StageCountMismatch {
                expected: self.stage_count,
                actual: self.stages.len(),
            });
        }
        Ok(())
    }

    /// Check that every playable stage carries a non-empty secret code.
    ///
    /// Enforced by the wholesale admin save so that no published catalog
    /// contains an unsolvable stage; piecewise edits may leave placeholders
    /// in place temporarily.
    pub fn validate_codes(&self) -> Result<(), CatalogError> {
        for (index, stage) in self.stages.iter().take(self.stage_count).enumerate() {
            if normalize_code(&stage.secret_code).is_empty() {
                return Err(CatalogError::EmptySecretCode(index));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let catalog = QuestCatalog::default();
        assert_eq!(catalog.stage_count, 5);
        catalog.validate().unwrap();
        catalog.validate_codes().unwrap();
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        let stage = StageDefinition::new("oak tree", "OAKTREEQUEST");
        assert!(stage.matches(" oaktreequest "));
        assert!(stage.matches("OakTreeQuest"));
        assert!(!stage.matches("SUNDIALSECRET"));
    }

    #[test]
    fn empty_code_matches_nothing() {
        let stage = StageDefinition::default();
        assert!(!stage.matches(""));
        assert!(!stage.matches("   "));
    }

    #[test]
    fn grow_preserves_entries_and_appends_placeholders() {
        let catalog = QuestCatalog::default().resized(3);
        assert_eq!(catalog.stage_count, 3);
        assert_eq!(catalog.stages.len(), 3);

        let original = catalog.stages.clone();
        let grown = catalog.resized(5);
        assert_eq!(grown.stage_count, 5);
        assert_eq!(grown.stages.len(), 5);
        assert_eq!(&grown.stages[..3], &original[..]);
        assert_eq!(grown.stages[3], StageDefinition::default());
        assert_eq!(grown.stages[4], StageDefinition::default());
    }

    #[test]
    fn shrink_truncates() {
        let catalog = QuestCatalog::default().resized(2);
        assert_eq!(catalog.stages.len(), 2);
        assert_eq!(catalog.stages[0].secret_code, "OAKTREEQUEST");
        assert_eq!(catalog.stages[1].secret_code, "SUNDIALSECRET");
        catalog.validate().unwrap();
    }

    #[test]
    fn validate_rejects_count_mismatch() {
        let mut catalog = QuestCatalog::default();
        catalog.stages.pop();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::StageCountMismatch { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn validate_codes_rejects_empty_secret() {
        let mut catalog = QuestCatalog::default();
        catalog.stages[2].secret_code = "  ".to_string();
        assert!(matches!(
            catalog.validate_codes(),
            Err(CatalogError::EmptySecretCode(2))
        ));
    }

    #[test]
    fn legacy_document_migrates() {
        let legacy = serde_json::json!({
            "gameStartCode": "WELCOME2024",
            "adminCode": "STAFFONLY",
            "quests": [
                { "description": "Scan the oak tree.", "qrCode": "OAKTREEQUEST" },
                { "description": "Find the sundial.", "qrCode": "SUNDIALSECRET" },
            ],
        });
        let catalog = QuestCatalog::from_value(legacy).unwrap();
        assert_eq!(catalog.schema_version, CATALOG_SCHEMA_VERSION);
        assert_eq!(catalog.stage_count, 2);
        assert_eq!(catalog.stages[1].secret_code, "SUNDIALSECRET");
        assert_eq!(catalog.start_code, "WELCOME2024");
        assert_eq!(catalog.admin_code, "STAFFONLY");
        // Missing coupon fields take defaults instead of failing the decode.
        assert_eq!(catalog.coupon_title, "Special Reward Coupon");
    }

    #[test]
    fn future_schema_version_is_refused() {
        let doc = serde_json::json!({ "schema_version": 99, "stageCount": 3 });
        assert!(matches!(
            QuestCatalog::from_value(doc),
            Err(CatalogError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn current_schema_round_trips() {
        let catalog = QuestCatalog::default();
        let value = serde_json::to_value(&catalog).unwrap();
        let back = QuestCatalog::from_value(value).unwrap();
        assert_eq!(back, catalog);
    }
}
