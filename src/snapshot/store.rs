// ============================================================================
// Snapshot Store
// ============================================================================
//
// Physical placement and enumeration of snapshot artifacts: one JSON file
// per snapshot under a dedicated directory, named from its creation time.
//
// ============================================================================

use crate::core::{BackupError, Result};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

const ARTIFACT_PREFIX: &str = "crm-backup-";
const ARTIFACT_EXT: &str = ".json";

lazy_static! {
    /// The only filename shape the store will read, delete, or list. Checked
    /// before any identifier is joined into a path, which is what closes the
    /// path-traversal hole on caller-supplied identifiers.
    static ref ARTIFACT_NAME: Regex =
        Regex::new(r"^crm-backup-\d{8}-\d{6}-\d{3}-\d{4}\.json$").unwrap();
}

/// Process-lifetime sequence appended to artifact names so that two
/// snapshots within the same millisecond still get distinct identifiers.
static NEXT_ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Receipt for a freshly written artifact.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReceipt {
    pub id: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Listing-level metadata for one stored artifact; no artifact body is read
/// to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    pub id: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

/// Artifact directory manager.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new artifact and return its receipt.
    ///
    /// The directory is created on first use. The write is atomic (temp file
    /// then rename), so a crash mid-write never leaves a half artifact under
    /// a listable name.
    pub async fn create(&self, bytes: &[u8], created_at: DateTime<Utc>) -> Result<SnapshotReceipt> {
        fs::create_dir_all(&self.dir).await.map_err(|err| {
            BackupError::Io(format!(
                "Failed to create snapshot directory '{}': {}",
                self.dir.display(),
                err
            ))
        })?;

        let id = self.reserve_name(created_at).await?;
        let path = self.dir.join(&id);
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, bytes).await.map_err(|err| {
            BackupError::Io(format!(
                "Failed to write temp file '{}': {}",
                tmp.display(),
                err
            ))
        })?;
        fs::rename(&tmp, &path).await.map_err(|err| {
            BackupError::Io(format!(
                "Failed to rename temp file '{}' -> '{}': {}",
                tmp.display(),
                path.display(),
                err
            ))
        })?;

        debug!(id = %id, size_bytes = bytes.len(), "snapshot artifact written");
        Ok(SnapshotReceipt {
            id,
            size_bytes: bytes.len() as u64,
            created_at,
        })
    }

    /// Enumerate stored artifacts, newest first.
    ///
    /// Only names matching the artifact convention are returned, so stray
    /// files (including the store's own leftover `.tmp` files) never leak
    /// into listings. A missing directory is an empty store, not an error.
    pub async fn list(&self) -> Result<Vec<SnapshotEntry>> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(err) => {
                return Err(BackupError::Io(format!(
                    "Failed to read snapshot directory '{}': {}",
                    self.dir.display(),
                    err
                )));
            }
        };

        while let Some(entry) = dir.next_entry().await.map_err(|err| {
            BackupError::Io(format!(
                "Failed to enumerate snapshot directory '{}': {}",
                self.dir.display(),
                err
            ))
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !ARTIFACT_NAME.is_match(&name) {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|err| {
                BackupError::Io(format!("Failed to stat artifact '{}': {}", name, err))
            })?;
            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            entries.push(SnapshotEntry {
                id: name,
                size_bytes: metadata.len(),
                modified_at,
            });
        }

        // Names embed the creation timestamp, so the id is a stable
        // tiebreaker when two artifacts share a modified time.
        entries.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    /// Read one artifact's bytes.
    pub async fn read(&self, id: &str) -> Result<Vec<u8>> {
        self.validate_id(id)?;
        let path = self.dir.join(id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BackupError::NotFound(id.to_string()))
            }
            Err(err) => Err(BackupError::Io(format!(
                "Failed to read artifact '{}': {}",
                path.display(),
                err
            ))),
        }
    }

    /// Remove one artifact. A missing artifact is a hard `NotFound`: callers
    /// asking for an explicit delete need to know the target was not there.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.validate_id(id)?;
        let path = self.dir.join(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BackupError::NotFound(id.to_string()))
            }
            Err(err) => Err(BackupError::Io(format!(
                "Failed to delete artifact '{}': {}",
                path.display(),
                err
            ))),
        }
    }

    /// Remove one artifact if present. Returns whether a file was actually
    /// removed; an already-gone artifact is `Ok(false)`, which is the
    /// contract retention sweeps rely on.
    pub async fn delete_if_exists(&self, id: &str) -> Result<bool> {
        match self.delete(id).await {
            Ok(()) => Ok(true),
            Err(BackupError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Reject any identifier that does not have the artifact naming shape.
    pub fn validate_id(&self, id: &str) -> Result<()> {
        if ARTIFACT_NAME.is_match(id) {
            Ok(())
        } else {
            Err(BackupError::InvalidIdentifier(id.to_string()))
        }
    }

    /// Pick a fresh artifact name: creation timestamp to the millisecond
    /// plus a process-lifetime sequence, skipping any name already on disk.
    async fn reserve_name(&self, created_at: DateTime<Utc>) -> Result<String> {
        loop {
            let seq = NEXT_ARTIFACT_SEQ.fetch_add(1, Ordering::SeqCst) % 10_000;
            let name = format!(
                "{}{}-{:04}{}",
                ARTIFACT_PREFIX,
                created_at.format("%Y%m%d-%H%M%S-%3f"),
                seq,
                ARTIFACT_EXT
            );
            let exists = fs::try_exists(self.dir.join(&name)).await.map_err(|err| {
                BackupError::Io(format!(
                    "Failed to check artifact path '{}': {}",
                    self.dir.join(&name).display(),
                    err
                ))
            })?;
            if !exists {
                return Ok(name);
            }
        }
    }
}
