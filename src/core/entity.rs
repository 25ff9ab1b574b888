// ============================================================================
// Entity Model
// ============================================================================
//
// Typed records for the five CRM collections that participate in
// backup/restore. The engine never inspects entity internals beyond the
// foreign keys that drive dependency ordering; everything else just has to
// round-trip byte-for-byte through the snapshot codec.
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five entity collections known to the backup engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Account,
    Lead,
    Activity,
    ClosedDeal,
    AuditLog,
}

impl EntityKind {
    /// Every collection, in snapshot-read order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Account,
        EntityKind::Lead,
        EntityKind::Activity,
        EntityKind::ClosedDeal,
        EntityKind::AuditLog,
    ];

    /// Restore delete order: children before parents. Accounts are identity
    /// records and are never deleted.
    pub const DELETE_ORDER: [EntityKind; 4] = [
        EntityKind::ClosedDeal,
        EntityKind::Activity,
        EntityKind::Lead,
        EntityKind::AuditLog,
    ];

    /// Restore insert order: parents before children.
    pub const INSERT_ORDER: [EntityKind; 4] = [
        EntityKind::Lead,
        EntityKind::Activity,
        EntityKind::ClosedDeal,
        EntityKind::AuditLog,
    ];

    /// Collection key as it appears inside an artifact.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "accounts",
            EntityKind::Lead => "leads",
            EntityKind::Activity => "activities",
            EntityKind::ClosedDeal => "closed_deals",
            EntityKind::AuditLog => "audit_log",
        }
    }

    /// Identity collections are excluded from restore's delete/insert cycle.
    pub fn is_identity(&self) -> bool {
        matches!(self, EntityKind::Account)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user/login record. Identity data: never part of restore's delete set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
            created_at: Utc::now(),
        }
    }
}

/// A sales lead. `owner_id` points at an [`Account`]; the reference is soft
/// because accounts sit outside the restore cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub company: String,
    pub status: String,
    pub estimated_value: i64,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: name.into(),
            company: company.into(),
            status: "New".to_string(),
            estimated_value: 0,
            created_at: Utc::now(),
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn estimated_value(mut self, value: i64) -> Self {
        self.estimated_value = value;
        self
    }
}

/// A touchpoint (call, email, meeting) against a lead. `lead_id` is a hard
/// reference: an activity cannot exist without its lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub lead_id: String,
    pub kind: String,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(lead_id: impl Into<String>, kind: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lead_id: lead_id.into(),
            kind: kind.into(),
            note: note.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// A won/lost deal. `lead_id` is a hard reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedDeal {
    pub id: String,
    pub lead_id: String,
    pub amount: i64,
    pub stage: String,
    pub closed_at: DateTime<Utc>,
}

impl ClosedDeal {
    pub fn new(lead_id: impl Into<String>, amount: i64, stage: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lead_id: lead_id.into(),
            amount,
            stage: stage.into(),
            closed_at: Utc::now(),
        }
    }
}

/// Historical audit data. Free-standing: replaced wholesale on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_id: String,
    pub action: String,
    pub detail: String,
    pub logged_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            actor_id: actor_id.into(),
            action: action.into(),
            detail: detail.into(),
            logged_at: Utc::now(),
        }
    }
}

/// One collection's records, tagged with its kind.
///
/// The repository seam speaks in batches so that the engine can move whole
/// collections without knowing entity internals, while the compiler still
/// checks that a batch of leads never lands in the activities table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordBatch {
    Accounts(Vec<Account>),
    Leads(Vec<Lead>),
    Activities(Vec<Activity>),
    ClosedDeals(Vec<ClosedDeal>),
    AuditLog(Vec<AuditLogEntry>),
}

impl RecordBatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            RecordBatch::Accounts(_) => EntityKind::Account,
            RecordBatch::Leads(_) => EntityKind::Lead,
            RecordBatch::Activities(_) => EntityKind::Activity,
            RecordBatch::ClosedDeals(_) => EntityKind::ClosedDeal,
            RecordBatch::AuditLog(_) => EntityKind::AuditLog,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Accounts(records) => records.len(),
            RecordBatch::Leads(records) => records.len(),
            RecordBatch::Activities(records) => records.len(),
            RecordBatch::ClosedDeals(records) => records.len(),
            RecordBatch::AuditLog(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The artifact's payload: exactly five collections, each always present.
///
/// A missing key in the encoded form is a corruption signal, which is why
/// none of these fields are optional and unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityCollections {
    pub accounts: Vec<Account>,
    pub leads: Vec<Lead>,
    pub activities: Vec<Activity>,
    pub closed_deals: Vec<ClosedDeal>,
    pub audit_log: Vec<AuditLogEntry>,
}

impl EntityCollections {
    /// Total records across all five collections.
    pub fn record_count(&self) -> usize {
        self.accounts.len()
            + self.leads.len()
            + self.activities.len()
            + self.closed_deals.len()
            + self.audit_log.len()
    }

    /// Records that actually participate in a restore (everything except
    /// identity records).
    pub fn restorable_count(&self) -> usize {
        self.record_count() - self.accounts.len()
    }

    /// Clone out one collection as a tagged batch.
    pub fn batch(&self, kind: EntityKind) -> RecordBatch {
        match kind {
            EntityKind::Account => RecordBatch::Accounts(self.accounts.clone()),
            EntityKind::Lead => RecordBatch::Leads(self.leads.clone()),
            EntityKind::Activity => RecordBatch::Activities(self.activities.clone()),
            EntityKind::ClosedDeal => RecordBatch::ClosedDeals(self.closed_deals.clone()),
            EntityKind::AuditLog => RecordBatch::AuditLog(self.audit_log.clone()),
        }
    }

    /// Replace one collection from a tagged batch.
    pub fn set_batch(&mut self, batch: RecordBatch) {
        match batch {
            RecordBatch::Accounts(records) => self.accounts = records,
            RecordBatch::Leads(records) => self.leads = records,
            RecordBatch::Activities(records) => self.activities = records,
            RecordBatch::ClosedDeals(records) => self.closed_deals = records,
            RecordBatch::AuditLog(records) => self.audit_log = records,
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Account => self.accounts.len(),
            EntityKind::Lead => self.leads.len(),
            EntityKind::Activity => self.activities.len(),
            EntityKind::ClosedDeal => self.closed_deals.len(),
            EntityKind::AuditLog => self.audit_log.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_and_insert_orders_are_inverse() {
        let mut reversed = EntityKind::INSERT_ORDER;
        reversed.reverse();
        // AuditLog is free-standing and sits last in both orders; the three
        // related kinds must be exact mirrors.
        assert_eq!(EntityKind::DELETE_ORDER[..3], reversed[1..]);
        assert_eq!(EntityKind::DELETE_ORDER[3], EntityKind::AuditLog);
    }

    #[test]
    fn test_identity_kind_excluded_from_restore_orders() {
        assert!(EntityKind::Account.is_identity());
        assert!(!EntityKind::DELETE_ORDER.contains(&EntityKind::Account));
        assert!(!EntityKind::INSERT_ORDER.contains(&EntityKind::Account));
    }

    #[test]
    fn test_restorable_count_excludes_accounts() {
        let mut collections = EntityCollections::default();
        collections.accounts.push(Account::new("Ada", "ada@crm.test", "admin"));
        let lead = Lead::new(collections.accounts[0].id.clone(), "Grace", "Hopper Inc");
        collections.activities.push(Activity::new(lead.id.clone(), "call", "intro"));
        collections.leads.push(lead);
        assert_eq!(collections.record_count(), 3);
        assert_eq!(collections.restorable_count(), 2);
    }

    #[test]
    fn test_batch_round_trip() {
        let mut collections = EntityCollections::default();
        let lead = Lead::new("owner-1", "Grace", "Hopper Inc").estimated_value(10_000);
        collections.leads.push(lead.clone());

        let batch = collections.batch(EntityKind::Lead);
        assert_eq!(batch.kind(), EntityKind::Lead);
        assert_eq!(batch.len(), 1);

        let mut other = EntityCollections::default();
        other.set_batch(batch);
        assert_eq!(other.leads, vec![lead]);
    }
}
