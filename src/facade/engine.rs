// ============================================================================
// Backup Engine Facade
// ============================================================================
//
// The administrative surface: everything an admin API layer or operator
// tool calls. Composes the repository, store, orchestrator, and retention
// manager through constructor injection; the crate has no global state.
//
// ============================================================================

use crate::core::{EntityCollections, EntityKind, Result};
use crate::repo::EntityRepository;
use crate::snapshot::artifact::SnapshotArtifact;
use crate::snapshot::codec;
use crate::snapshot::restore::{RestoreOrchestrator, RestoreOutcome};
use crate::snapshot::retention::{RetentionManager, RetentionSweep};
use crate::snapshot::store::{SnapshotEntry, SnapshotReceipt, SnapshotStore};
use crate::snapshot::BackupConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Aggregate view of the snapshot directory.
#[derive(Debug, Clone, Serialize)]
pub struct BackupStats {
    pub total_snapshots: usize,
    pub total_size_bytes: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// What one artifact contains, reported without touching the repository.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub id: String,
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub record_count: usize,
    pub accounts: usize,
    pub leads: usize,
    pub activities: usize,
    pub closed_deals: usize,
    pub audit_log: usize,
}

/// Administrative entry point for the backup subsystem.
pub struct BackupEngine<R: EntityRepository> {
    repo: Arc<R>,
    store: Arc<SnapshotStore>,
    orchestrator: RestoreOrchestrator<R>,
    retention: RetentionManager,
    config: BackupConfig,
}

impl<R: EntityRepository> BackupEngine<R> {
    pub fn new(repo: Arc<R>, config: BackupConfig) -> Self {
        let store = Arc::new(SnapshotStore::new(config.snapshot_dir.clone()));
        let orchestrator = RestoreOrchestrator::new(Arc::clone(&store), Arc::clone(&repo));
        let retention = RetentionManager::new(Arc::clone(&store));
        Self {
            repo,
            store,
            orchestrator,
            retention,
            config,
        }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Snapshot all five collections into one new artifact.
    ///
    /// Collections are read sequentially, read-only, before any byte is
    /// written; expect latency proportional to data volume. Repository and
    /// store errors are hard failures surfaced to the caller.
    pub async fn create_snapshot(&self) -> Result<SnapshotReceipt> {
        let mut collections = EntityCollections::default();
        for kind in EntityKind::ALL {
            let batch = self.repo.list_all(kind).await?;
            collections.set_batch(batch);
        }

        let created_at = Utc::now();
        let artifact = SnapshotArtifact::new(collections, created_at);
        let record_count = artifact.record_count;
        let bytes = codec::encode(&artifact)?;
        let receipt = self.store.create(&bytes, created_at).await?;
        info!(
            id = %receipt.id,
            record_count,
            size_bytes = receipt.size_bytes,
            "snapshot created"
        );
        Ok(receipt)
    }

    /// Enumerate stored snapshots, newest first.
    pub async fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>> {
        self.store.list().await
    }

    /// Replace the live non-identity collections with a snapshot's
    /// contents, atomically. See [`RestoreOrchestrator::restore`].
    pub async fn restore_snapshot(&self, id: &str) -> Result<RestoreOutcome> {
        self.orchestrator.restore(id).await
    }

    /// Keep only the newest `keep_count` snapshots.
    pub async fn apply_retention(&self, keep_count: usize) -> Result<RetentionSweep> {
        let sweep = self.retention.apply(keep_count).await?;
        if sweep.failed > 0 {
            warn!(
                deleted = sweep.deleted,
                failed = sweep.failed,
                "retention sweep left artifacts behind"
            );
        }
        Ok(sweep)
    }

    /// Aggregate stats over the snapshot directory, from listing metadata
    /// alone.
    pub async fn stats(&self) -> Result<BackupStats> {
        let entries = self.store.list().await?;
        Ok(BackupStats {
            total_snapshots: entries.len(),
            total_size_bytes: entries.iter().map(|entry| entry.size_bytes).sum(),
            // Listing is newest-first.
            newest: entries.first().map(|entry| entry.modified_at),
            oldest: entries.last().map(|entry| entry.modified_at),
        })
    }

    /// Fetch one artifact's raw bytes, for export. The identifier passes
    /// the same naming-pattern check as every other store access before any
    /// filesystem path is formed.
    pub async fn download_snapshot(&self, id: &str) -> Result<Vec<u8>> {
        self.store.read(id).await
    }

    /// Explicitly delete one artifact. Unlike retention's best-effort
    /// sweeps, a missing artifact here is a hard `NotFound`.
    pub async fn delete_snapshot(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        info!(id, "snapshot deleted");
        Ok(())
    }

    /// Decode one artifact and report what it holds, without touching the
    /// repository.
    pub async fn inspect_snapshot(&self, id: &str) -> Result<ArtifactSummary> {
        let bytes = self.store.read(id).await?;
        let artifact = codec::decode(&bytes)?;
        let collections = &artifact.entity_collections;
        Ok(ArtifactSummary {
            id: id.to_string(),
            schema_version: artifact.schema_version.clone(),
            created_at: artifact.created_at,
            record_count: artifact.record_count,
            accounts: collections.accounts.len(),
            leads: collections.leads.len(),
            activities: collections.activities.len(),
            closed_deals: collections.closed_deals.len(),
            audit_log: collections.audit_log.len(),
        })
    }
}
