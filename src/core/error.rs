use thiserror::Error;

/// Error taxonomy for the backup engine.
///
/// The first six variants are the contract surface: callers match on them
/// to distinguish a damaged artifact from a missing one, a rejected
/// identifier from a failed replay. The remaining variants carry
/// collaborator failures (repository, filesystem, serializer) with enough
/// context to diagnose them from a log line.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The artifact's bytes do not form a well-shaped snapshot.
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// A restore refused the artifact: corrupt, or an unsupported format
    /// version.
    #[error("Invalid backup format: {0}")]
    InvalidBackupFormat(String),

    /// No stored artifact under that identifier.
    #[error("Snapshot '{0}' not found")]
    NotFound(String),

    /// The identifier does not have the artifact naming shape. Raised
    /// before any filesystem path is built from it.
    #[error("Invalid snapshot identifier '{0}'")]
    InvalidIdentifier(String),

    /// The restore transaction failed and was rolled back; the live
    /// dataset is unchanged.
    #[error("Restore failed and was rolled back: {source}")]
    RestoreFailed {
        #[source]
        source: Box<BackupError>,
    },

    /// A retention sweep deleted some artifacts but could not delete
    /// others.
    #[error("Retention sweep incomplete: {deleted} deleted, {failed} failed")]
    RetentionPartialFailure { deleted: usize, failed: usize },

    /// Failure inside the entity repository.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Filesystem failure in the snapshot store.
    #[error("I/O error: {0}")]
    Io(String),

    /// Artifact encoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Misuse of a component, such as starting a scheduler twice.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackupError {
    /// Wrap a failure that happened inside a restore transaction. The
    /// caller has already rolled the transaction back.
    pub fn restore_failed(source: BackupError) -> Self {
        Self::RestoreFailed {
            source: Box::new(source),
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, BackupError>;
