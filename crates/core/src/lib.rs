//! Questline core data models.
//!
//! This crate defines the fundamental data structures of the QR quest game:
//! the admin-configured quest catalog, per-user progress records, and the
//! typed outcomes of the stage-advance and coupon-redemption operations.

#![warn(missing_docs)]

// Core identities
mod id;

// Admin-configured game content
mod catalog;

// Per-user state
mod progress;

// Authorization allow-list
mod admin;

// Operation results
mod outcome;

// Re-exports
pub use id::{AdminKey, UserId};

pub use catalog::{
    normalize_code, CatalogError, QuestCatalog, StageDefinition, CATALOG_SCHEMA_VERSION,
};
pub use progress::{same_local_day, AvatarVariant, CompletionStatus, UserProgress};
pub use admin::AdminEntry;
pub use outcome::{AdvanceOutcome, RedeemOutcome};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
