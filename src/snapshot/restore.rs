// ============================================================================
// Restore Orchestrator
// ============================================================================
//
// The highest-risk operation in the crate: replace the live non-identity
// collections with a snapshot's contents, atomically. Everything between
// `begin` and `commit` runs under one repository transaction; any failure
// rolls back and the live dataset is left exactly as it was.
//
// ============================================================================

use crate::core::{BackupError, EntityKind, Result};
use crate::repo::{EntityRepository, TransactionId};
use crate::snapshot::artifact::SnapshotArtifact;
use crate::snapshot::codec;
use crate::snapshot::store::SnapshotStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    /// Records actually inserted during the replay.
    pub restored_count: usize,
    /// The artifact's restorable total: its stated `record_count` minus the
    /// identity rows it carried, which never enter the replay.
    pub expected_count: usize,
}

impl RestoreOutcome {
    /// A count mismatch is reportable, not fatal; it can legitimately occur
    /// from schema drift between backup time and restore time.
    pub fn count_discrepancy(&self) -> bool {
        self.restored_count != self.expected_count
    }
}

/// Replays a stored artifact into the repository under one transaction.
pub struct RestoreOrchestrator<R: EntityRepository> {
    store: Arc<SnapshotStore>,
    repo: Arc<R>,
}

impl<R: EntityRepository> RestoreOrchestrator<R> {
    pub fn new(store: Arc<SnapshotStore>, repo: Arc<R>) -> Self {
        Self { store, repo }
    }

    /// Restore one snapshot by identifier.
    ///
    /// No repository call is made until the artifact has been read, decoded,
    /// and its format version accepted, so a corrupt artifact can never
    /// touch live data. This operation is not retried automatically: a
    /// failed restore rolls back and waits for a deliberate re-invocation.
    pub async fn restore(&self, id: &str) -> Result<RestoreOutcome> {
        let bytes = self.store.read(id).await?;
        let artifact = codec::decode(&bytes)
            .map_err(|err| BackupError::InvalidBackupFormat(err.to_string()))?;
        if !artifact.version_supported() {
            return Err(BackupError::InvalidBackupFormat(format!(
                "Unsupported schema version '{}'",
                artifact.schema_version
            )));
        }

        info!(
            id,
            record_count = artifact.record_count,
            schema_version = %artifact.schema_version,
            "starting restore"
        );

        let tx = self
            .repo
            .begin()
            .await
            .map_err(BackupError::restore_failed)?;

        let restored_count = match self.replay(tx, &artifact).await {
            Ok(count) => count,
            Err(err) => {
                if let Err(rollback_err) = self.repo.rollback(tx).await {
                    warn!(%tx, error = %rollback_err, "rollback after failed restore also failed");
                }
                return Err(BackupError::restore_failed(err));
            }
        };

        if let Err(commit_err) = self.repo.commit(tx).await {
            if let Err(rollback_err) = self.repo.rollback(tx).await {
                warn!(%tx, error = %rollback_err, "rollback after failed commit also failed");
            }
            return Err(BackupError::restore_failed(commit_err));
        }

        let outcome = RestoreOutcome {
            restored_count,
            expected_count: artifact.restorable_count(),
        };
        if outcome.count_discrepancy() {
            warn!(
                id,
                restored = outcome.restored_count,
                expected = outcome.expected_count,
                "restored record count differs from the artifact's stated count"
            );
        } else {
            info!(id, restored = outcome.restored_count, "restore committed");
        }
        Ok(outcome)
    }

    /// Delete children before parents, then insert parents before children.
    /// Identity records are never deleted; the ordering is a foreign-key
    /// correctness requirement, not a performance choice.
    async fn replay(&self, tx: TransactionId, artifact: &SnapshotArtifact) -> Result<usize> {
        for kind in EntityKind::DELETE_ORDER {
            self.repo.delete_all(tx, kind).await?;
        }

        let mut restored = 0;
        for kind in EntityKind::INSERT_ORDER {
            let batch = artifact.entity_collections.batch(kind);
            if batch.is_empty() {
                continue;
            }
            restored += batch.len();
            self.repo.bulk_insert(tx, batch).await?;
        }
        Ok(restored)
    }
}
