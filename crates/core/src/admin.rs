//! Admin allow-list entries.

use serde::{Deserialize, Serialize};

use crate::id::AdminKey;

/// One entry of the admin allow-list.
///
/// Membership is the only authorization signal the core consumes: an
/// identity is an admin iff some entry carries its `identity_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEntry {
    /// Record key
    pub key: AdminKey,

    /// Identity-layer identifier of the privileged user
    #[serde(alias = "id")]
    pub identity_id: String,

    /// Display name
    pub name: String,
}

impl AdminEntry {
    /// Create an allow-list entry for an identity.
    pub fn new(identity_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: AdminKey::new(),
            identity_id: identity_id.into(),
            name: name.into(),
        }
    }
}
