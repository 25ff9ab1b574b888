use crate::core::{BackupError, Result};
use crate::snapshot::store::SnapshotStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Summary of one retention sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionSweep {
    /// Artifacts removed (or already gone by the time the sweep reached
    /// them; the goal state was reached either way).
    pub deleted: usize,
    /// Artifacts the sweep could not remove.
    pub failed: usize,
}

impl RetentionSweep {
    /// Strict view for callers that treat an incomplete sweep as an error.
    /// The scheduler never uses this; its sweeps stay best-effort.
    pub fn ensure_complete(self) -> Result<RetentionSweep> {
        if self.failed > 0 {
            Err(BackupError::RetentionPartialFailure {
                deleted: self.deleted,
                failed: self.failed,
            })
        } else {
            Ok(self)
        }
    }
}

/// Bounds snapshot storage by keeping only the newest N artifacts.
pub struct RetentionManager {
    store: Arc<SnapshotStore>,
}

impl RetentionManager {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Delete every artifact beyond the newest `keep_count`.
    ///
    /// Individual deletion failures are logged and counted but do not abort
    /// the rest of the sweep. Only a failure to list the store at all is a
    /// hard error.
    pub async fn apply(&self, keep_count: usize) -> Result<RetentionSweep> {
        let entries = self.store.list().await?;
        if entries.len() <= keep_count {
            debug!(
                total = entries.len(),
                keep_count, "retention sweep: nothing to delete"
            );
            return Ok(RetentionSweep::default());
        }

        let mut sweep = RetentionSweep::default();
        for entry in &entries[keep_count..] {
            match self.store.delete_if_exists(&entry.id).await {
                Ok(_) => sweep.deleted += 1,
                Err(err) => {
                    warn!(id = %entry.id, error = %err, "retention sweep could not delete artifact");
                    sweep.failed += 1;
                }
            }
        }

        debug!(
            deleted = sweep.deleted,
            failed = sweep.failed,
            keep_count,
            "retention sweep finished"
        );
        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn store_with_artifacts(count: usize) -> (TempDir, Arc<SnapshotStore>) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SnapshotStore::new(temp_dir.path()));
        for _ in 0..count {
            store.create(b"{}", Utc::now()).await.unwrap();
        }
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_keep_count_larger_than_total_is_noop() {
        let (_guard, store) = store_with_artifacts(4).await;
        let sweep = RetentionManager::new(store.clone()).apply(50).await.unwrap();
        assert_eq!(sweep.deleted, 0);
        assert_eq!(sweep.failed, 0);
        assert_eq!(store.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_keep_zero_deletes_everything() {
        let (_guard, store) = store_with_artifacts(3).await;
        let sweep = RetentionManager::new(store.clone()).apply(0).await.unwrap();
        assert_eq!(sweep.deleted, 3);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_complete_surfaces_partial_failure() {
        let sweep = RetentionSweep {
            deleted: 2,
            failed: 1,
        };
        let err = sweep.ensure_complete().unwrap_err();
        assert!(matches!(
            err,
            BackupError::RetentionPartialFailure {
                deleted: 2,
                failed: 1
            }
        ));
        assert!(RetentionSweep::default().ensure_complete().is_ok());
    }
}
