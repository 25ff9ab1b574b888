pub mod artifact;
pub mod codec;
pub mod restore;
pub mod retention;
pub mod scheduler;
pub mod store;

pub use artifact::{SnapshotArtifact, SCHEMA_VERSION};
pub use restore::{RestoreOrchestrator, RestoreOutcome};
pub use retention::{RetentionManager, RetentionSweep};
pub use scheduler::{BackupScheduler, CycleReport};
pub use store::{SnapshotEntry, SnapshotReceipt, SnapshotStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Backup engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory holding snapshot artifacts
    pub snapshot_dir: PathBuf,

    /// Snapshots kept by retention sweeps
    pub keep_count: usize,

    /// Interval between scheduled backup cycles
    pub interval: Duration,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("./crm-backups"),
            keep_count: 30,
            interval: Duration::from_secs(3600),
        }
    }
}

impl BackupConfig {
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            ..Self::default()
        }
    }

    /// Set the snapshot directory
    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Set the retention keep-count
    pub fn keep_count(mut self, keep_count: usize) -> Self {
        self.keep_count = keep_count;
        self
    }

    /// Set the scheduled backup interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
