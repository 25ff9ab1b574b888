// ============================================================================
// Entity Repository Seam
// ============================================================================
//
// The backup engine's only view of the relational store. Production wires a
// real data-access layer behind this trait; tests and the demo binary use
// the in-memory reference implementation.
//
// ============================================================================

pub mod memory;

use crate::core::{EntityKind, RecordBatch, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

pub use memory::InMemoryRepository;

/// Global transaction ID counter
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a repository transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Generate a new unique transaction ID
    pub fn new() -> Self {
        TransactionId(NEXT_TX_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

/// Data-access contract consumed by the backup engine.
///
/// `delete_all` and `bulk_insert` only run inside a transaction opened with
/// [`begin`](EntityRepository::begin); any error between `begin` and
/// `commit` obliges the caller to `rollback`, and the implementation must
/// then leave the store exactly as it was at `begin`.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Read one full collection. Runs outside any transaction.
    async fn list_all(&self, kind: EntityKind) -> Result<RecordBatch>;

    /// Open a transaction covering subsequent `delete_all`/`bulk_insert`
    /// calls.
    async fn begin(&self) -> Result<TransactionId>;

    /// Make the transaction's writes durable.
    async fn commit(&self, tx: TransactionId) -> Result<()>;

    /// Discard every write made under the transaction.
    async fn rollback(&self, tx: TransactionId) -> Result<()>;

    /// Remove every record of one collection, inside the transaction.
    async fn delete_all(&self, tx: TransactionId, kind: EntityKind) -> Result<()>;

    /// Append a batch of records, inside the transaction. Must be a no-op on
    /// an empty batch.
    async fn bulk_insert(&self, tx: TransactionId, batch: RecordBatch) -> Result<()>;
}
