// ============================================================================
// crmvault Library
// ============================================================================
//
// Point-in-time snapshot and restore engine for a CRM's five entity
// collections (Account, Lead, Activity, ClosedDeal, AuditLog), layered on a
// pluggable data-access seam.
//
// - Snapshot: read all collections, encode one self-describing artifact,
//   write it atomically under a timestamped name.
// - Restore: decode, validate, then replay into the repository inside one
//   transaction, children-before-parents on delete and parents-before-
//   children on insert. Identity (account) records are never deleted.
// - Retention: keep the newest N artifacts, best-effort sweep.
// - Scheduler: periodic create-then-retain cycles that log failures instead
//   of propagating them.
//
// ============================================================================

pub mod core;
pub mod facade;
pub mod repo;
pub mod snapshot;

// Re-export main types for convenience
pub use crate::core::{
    Account, Activity, AuditLogEntry, BackupError, ClosedDeal, EntityCollections, EntityKind,
    Lead, RecordBatch, Result,
};
pub use facade::{ArtifactSummary, BackupEngine, BackupStats};
pub use repo::{EntityRepository, InMemoryRepository, TransactionId};
pub use snapshot::{
    BackupConfig, BackupScheduler, CycleReport, RestoreOrchestrator, RestoreOutcome,
    RetentionManager, RetentionSweep, SnapshotArtifact, SnapshotEntry, SnapshotReceipt,
    SnapshotStore, SCHEMA_VERSION,
};
