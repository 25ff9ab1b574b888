// ============================================================================
// Snapshot Codec
// ============================================================================
//
// Pure byte-level transformation between a SnapshotArtifact and its stored
// form. JSON keeps the artifact self-describing and inspectable with stock
// tooling, and chrono's RFC 3339 serde representation round-trips
// timestamps at full precision.
//
// ============================================================================

use crate::core::{BackupError, Result};
use crate::snapshot::artifact::SnapshotArtifact;
use serde_json::Value;

/// The five collection keys an artifact must carry, each present even when
/// empty. Anything more or less is corruption.
const COLLECTION_KEYS: [&str; 5] = ["accounts", "leads", "activities", "closed_deals", "audit_log"];

/// Serialize an artifact to its durable form.
pub fn encode(artifact: &SnapshotArtifact) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(artifact)
        .map_err(|err| BackupError::Serialization(format!("Failed to encode snapshot: {}", err)))
}

/// Parse an artifact, validating structure before the typed pass.
///
/// The structural pass fails `CorruptArtifact` when `schema_version` is
/// absent, `entity_collections` is absent or is not a mapping of arrays, or
/// the five known collection keys are not exactly present. A
/// present-but-unknown `schema_version` decodes fine; whether to accept it
/// is the caller's decision.
pub fn decode(bytes: &[u8]) -> Result<SnapshotArtifact> {
    let value: Value = serde_json::from_slice(bytes).map_err(|err| {
        BackupError::CorruptArtifact(format!("Artifact is not valid JSON: {}", err))
    })?;

    let root = value
        .as_object()
        .ok_or_else(|| BackupError::CorruptArtifact("Artifact root is not an object".to_string()))?;

    match root.get("schema_version") {
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(BackupError::CorruptArtifact(
                "Field 'schema_version' is not a string".to_string(),
            ));
        }
        None => {
            return Err(BackupError::CorruptArtifact(
                "Missing required field 'schema_version'".to_string(),
            ));
        }
    }

    let collections = root
        .get("entity_collections")
        .ok_or_else(|| {
            BackupError::CorruptArtifact(
                "Missing required field 'entity_collections'".to_string(),
            )
        })?
        .as_object()
        .ok_or_else(|| {
            BackupError::CorruptArtifact("Field 'entity_collections' is not a mapping".to_string())
        })?;

    for key in COLLECTION_KEYS {
        match collections.get(key) {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(BackupError::CorruptArtifact(format!(
                    "Collection '{}' is not an array",
                    key
                )));
            }
            None => {
                return Err(BackupError::CorruptArtifact(format!(
                    "Missing collection key '{}'",
                    key
                )));
            }
        }
    }
    for key in collections.keys() {
        if !COLLECTION_KEYS.contains(&key.as_str()) {
            return Err(BackupError::CorruptArtifact(format!(
                "Unknown collection key '{}'",
                key
            )));
        }
    }

    serde_json::from_value(value)
        .map_err(|err| BackupError::CorruptArtifact(format!("Failed to decode artifact: {}", err)))
}
