pub mod entity;
pub mod error;

pub use entity::{
    Account, Activity, AuditLogEntry, ClosedDeal, EntityCollections, EntityKind, Lead, RecordBatch,
};
pub use error::{BackupError, Result};
