//! Engine error type.

use questline_core::CatalogError;
use questline_storage::StorageError;

/// Errors that abort an engine operation.
///
/// Expected game conditions (wrong code, duplicate scan, ...) are not
/// errors; they are variants of the operation's outcome type. An
/// `EngineError` means the operation could not be decided at all and is
/// safe to retry, since nothing mutates before the single committing write.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Storage I/O failed; surfaced to the caller, never swallowed.
    #[error("persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// The catalog is absent or structurally inconsistent; the engine
    /// refuses to run partial logic against it.
    #[error("quest catalog is corrupt: {0}")]
    CorruptCatalog(String),

    /// A catalog mutation failed validation.
    #[error("catalog rejected: {0}")]
    Catalog(#[from] CatalogError),

    /// Conditional progress writes kept losing races and the retry budget
    /// ran out.
    #[error("progress update contention, retries exhausted")]
    Contention,
}
