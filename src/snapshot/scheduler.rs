// ============================================================================
// Backup Scheduler
// ============================================================================
//
// Periodic unattended backup cycles: create a snapshot, then apply
// retention. Failure policy is the opposite of restore's: everything is
// caught, logged, and absorbed, because a failed automated backup must
// never destabilize the host process. The next tick simply tries again.
//
// ============================================================================

use crate::core::{BackupError, Result};
use crate::facade::BackupEngine;
use crate::repo::EntityRepository;
use crate::snapshot::retention::RetentionSweep;
use crate::snapshot::store::SnapshotReceipt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info};
use uuid::Uuid;

/// What one scheduled cycle did. This is an explicit best-effort result:
/// `run_cycle` never returns `Err`, it returns a report with the failures
/// written down.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Correlation id threaded through the cycle's log events.
    pub cycle_id: String,
    pub snapshot: Option<SnapshotReceipt>,
    pub snapshot_error: Option<String>,
    pub retention: Option<RetentionSweep>,
    pub retention_error: Option<String>,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.snapshot_error.is_none() && self.retention_error.is_none()
    }
}

/// Periodic trigger around a [`BackupEngine`].
pub struct BackupScheduler<R: EntityRepository> {
    engine: Arc<BackupEngine<R>>,
    interval: Duration,
    keep_count: usize,
    running: Arc<RwLock<bool>>,
}

// Manual Clone: the engine is behind an Arc, so R itself need not be Clone.
impl<R: EntityRepository> Clone for BackupScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            interval: self.interval,
            keep_count: self.keep_count,
            running: Arc::clone(&self.running),
        }
    }
}

impl<R: EntityRepository + 'static> BackupScheduler<R> {
    pub fn new(engine: Arc<BackupEngine<R>>, interval: Duration, keep_count: usize) -> Self {
        Self {
            engine,
            interval,
            keep_count,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the periodic loop.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.write().await;
        if *running {
            return Err(BackupError::Internal(
                "Scheduler already running".to_string(),
            ));
        }
        *running = true;
        info!(interval_secs = self.interval.as_secs(), keep_count = self.keep_count, "backup scheduler started");

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_loop().await;
        });
        Ok(())
    }

    /// Stop the periodic loop after its current tick.
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.write().await;
        if !*running {
            return Err(BackupError::Internal("Scheduler not running".to_string()));
        }
        *running = false;
        info!("backup scheduler stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    async fn run_loop(&self) {
        let mut ticker = interval(self.interval);
        // The first tick of a tokio interval fires immediately; skip it so
        // starting the scheduler does not also mean an instant backup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !*self.running.read().await {
                break;
            }
            self.run_cycle().await;
        }
    }

    /// Run one create-then-retain cycle. Never panics, never returns `Err`;
    /// every failure is logged under the cycle's correlation id and recorded
    /// in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle_id = Uuid::new_v4().to_string();
        let mut report = CycleReport {
            cycle_id: cycle_id.clone(),
            snapshot: None,
            snapshot_error: None,
            retention: None,
            retention_error: None,
        };

        match self.engine.create_snapshot().await {
            Ok(receipt) => {
                info!(cycle_id = %cycle_id, id = %receipt.id, size_bytes = receipt.size_bytes, "scheduled snapshot created");
                report.snapshot = Some(receipt);
            }
            Err(err) => {
                error!(cycle_id = %cycle_id, error = %err, "scheduled snapshot failed");
                report.snapshot_error = Some(err.to_string());
                // No retention after a failed snapshot: never shrink the
                // window of good backups on a bad cycle.
                return report;
            }
        }

        match self.engine.apply_retention(self.keep_count).await {
            Ok(sweep) => {
                if sweep.failed > 0 {
                    error!(cycle_id = %cycle_id, deleted = sweep.deleted, failed = sweep.failed, "scheduled retention sweep incomplete");
                }
                report.retention = Some(sweep);
            }
            Err(err) => {
                error!(cycle_id = %cycle_id, error = %err, "scheduled retention failed");
                report.retention_error = Some(err.to_string());
            }
        }
        report
    }
}
