use super::{EntityRepository, TransactionId};
use crate::core::{BackupError, EntityCollections, EntityKind, RecordBatch, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// In-memory reference implementation of [`EntityRepository`].
///
/// One active transaction at a time: `begin` takes an undo copy of the whole
/// store, `rollback` restores it. Referential checks make restore's
/// dependency ordering load-bearing rather than decorative — inserting an
/// activity or deal whose `lead_id` has no matching lead fails, as does
/// deleting leads while dependent rows remain.
pub struct InMemoryRepository {
    state: RwLock<RepoState>,
}

struct RepoState {
    collections: EntityCollections,
    active: Option<ActiveTransaction>,
}

struct ActiveTransaction {
    id: TransactionId,
    undo: EntityCollections,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RepoState {
                collections: EntityCollections::default(),
                active: None,
            }),
        }
    }

    /// Overwrite the store wholesale. Test/demo seeding only; not part of
    /// the repository contract.
    pub async fn seed(&self, collections: EntityCollections) {
        let mut state = self.state.write().await;
        state.collections = collections;
    }

    /// Copy out the entire store for assertions.
    pub async fn dump(&self) -> EntityCollections {
        self.state.read().await.collections.clone()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoState {
    fn check_tx(&self, tx: TransactionId) -> Result<()> {
        match &self.active {
            Some(active) if active.id == tx => Ok(()),
            Some(active) => Err(BackupError::Repository(format!(
                "Transaction {} is not active (current: {})",
                tx, active.id
            ))),
            None => Err(BackupError::Repository(format!(
                "Transaction {} is not active (no open transaction)",
                tx
            ))),
        }
    }

    fn lead_ids(&self) -> HashSet<&str> {
        self.collections
            .leads
            .iter()
            .map(|lead| lead.id.as_str())
            .collect()
    }
}

#[async_trait]
impl EntityRepository for InMemoryRepository {
    async fn list_all(&self, kind: EntityKind) -> Result<RecordBatch> {
        let state = self.state.read().await;
        Ok(state.collections.batch(kind))
    }

    async fn begin(&self) -> Result<TransactionId> {
        let mut state = self.state.write().await;
        if let Some(active) = &state.active {
            return Err(BackupError::Repository(format!(
                "Transaction {} is already active; concurrent transactions are not supported",
                active.id
            )));
        }
        let id = TransactionId::new();
        state.active = Some(ActiveTransaction {
            id,
            undo: state.collections.clone(),
        });
        Ok(id)
    }

    async fn commit(&self, tx: TransactionId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        state.active = None;
        Ok(())
    }

    async fn rollback(&self, tx: TransactionId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        let undo = state.active.take().map(|active| active.undo);
        if let Some(undo) = undo {
            state.collections = undo;
        }
        Ok(())
    }

    async fn delete_all(&self, tx: TransactionId, kind: EntityKind) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        if kind == EntityKind::Lead
            && (!state.collections.activities.is_empty()
                || !state.collections.closed_deals.is_empty())
        {
            return Err(BackupError::Repository(
                "Deleting all leads violates foreign key constraint: dependent activities or closed deals remain".to_string(),
            ));
        }
        state.collections.set_batch(match kind {
            EntityKind::Account => RecordBatch::Accounts(Vec::new()),
            EntityKind::Lead => RecordBatch::Leads(Vec::new()),
            EntityKind::Activity => RecordBatch::Activities(Vec::new()),
            EntityKind::ClosedDeal => RecordBatch::ClosedDeals(Vec::new()),
            EntityKind::AuditLog => RecordBatch::AuditLog(Vec::new()),
        });
        Ok(())
    }

    async fn bulk_insert(&self, tx: TransactionId, batch: RecordBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        match batch {
            RecordBatch::Accounts(records) => state.collections.accounts.extend(records),
            RecordBatch::Leads(records) => state.collections.leads.extend(records),
            RecordBatch::Activities(records) => {
                let lead_ids = state.lead_ids();
                for record in &records {
                    if !lead_ids.contains(record.lead_id.as_str()) {
                        return Err(BackupError::Repository(format!(
                            "Activity '{}' references non-existent key lead_id='{}'",
                            record.id, record.lead_id
                        )));
                    }
                }
                drop(lead_ids);
                state.collections.activities.extend(records);
            }
            RecordBatch::ClosedDeals(records) => {
                let lead_ids = state.lead_ids();
                for record in &records {
                    if !lead_ids.contains(record.lead_id.as_str()) {
                        return Err(BackupError::Repository(format!(
                            "ClosedDeal '{}' references non-existent key lead_id='{}'",
                            record.id, record.lead_id
                        )));
                    }
                }
                drop(lead_ids);
                state.collections.closed_deals.extend(records);
            }
            RecordBatch::AuditLog(records) => state.collections.audit_log.extend(records),
        }
        Ok(())
    }
}
