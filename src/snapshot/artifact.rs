use crate::core::EntityCollections;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Artifact format version written by this build.
///
/// Restore accepts any artifact sharing the current major version and fails
/// closed on everything else.
pub const SCHEMA_VERSION: &str = "1.0";

const SUPPORTED_MAJOR: &str = "1";

/// One full snapshot: the five entity collections under a self-describing
/// envelope. Write-once, read-many, delete-whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotArtifact {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub entity_collections: EntityCollections,
    /// Total records across all five collections, embedded at encode time so
    /// a restore can report drift between what was stored and what came back.
    pub record_count: usize,
}

impl SnapshotArtifact {
    pub fn new(entity_collections: EntityCollections, created_at: DateTime<Utc>) -> Self {
        let record_count = entity_collections.record_count();
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at,
            entity_collections,
            record_count,
        }
    }

    /// Records restore will actually replay: the stated total minus the
    /// artifact's identity rows, which never enter the delete/insert cycle.
    pub fn restorable_count(&self) -> usize {
        self.record_count
            .saturating_sub(self.entity_collections.accounts.len())
    }

    /// Whether this build knows how to restore the artifact's format.
    pub fn version_supported(&self) -> bool {
        self.schema_version
            .split('.')
            .next()
            .is_some_and(|major| major == SUPPORTED_MAJOR)
    }
}
