// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use common::{Client, Job, Quote};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;

use crate::error::AppError;
use crate::store::{CLIENTS, JOBS, QUOTES, Store};

/// Version written into every export. Imports of older snapshots run
/// through the migration table below before validation.
pub const SNAPSHOT_VERSION: u64 = 1;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("snapshot version {version} is not supported")]
    UnsupportedVersion { version: u64 },

    #[error("invalid snapshot: {reason}")]
    Invalid { reason: String },
}

impl From<BackupError> for AppError {
    fn from(err: BackupError) -> Self {
        AppError::new(StatusCode::BAD_REQUEST, &err.to_string())
    }
}

type Migration = fn(Map<String, Value>) -> Result<Map<String, Value>, BackupError>;

/// Migrations keyed by the version they upgrade *from*. Each one lifts a
/// snapshot a single version.
const MIGRATIONS: &[(u64, Migration)] = &[(0, migrate_v0_to_v1)];

/// Version 0 is the legacy device dump: the same key/value map, just
/// without a version field.
fn migrate_v0_to_v1(mut snapshot: Map<String, Value>) -> Result<Map<String, Value>, BackupError> {
    snapshot.insert("schemaVersion".to_string(), json!(1));
    Ok(snapshot)
}

/// Handler for exporting the whole namespace. Collection values are the
/// exact stored strings (string-encoded JSON arrays), so the snapshot
/// keeps the doubly-encoded wire shape older backups have.
pub async fn export_backup(State(store): State<Store>) -> Result<Json<Value>, AppError> {
    let mut snapshot = Map::new();
    for key in [CLIENTS, QUOTES, JOBS] {
        snapshot.insert(key.to_string(), json!("[]"));
    }
    for (key, value) in store.snapshot().await? {
        snapshot.insert(key, Value::String(value));
    }
    snapshot.insert("schemaVersion".to_string(), json!(SNAPSHOT_VERSION));

    info!("Backup exported ({} keys).", snapshot.len());
    Ok(Json(Value::Object(snapshot)))
}

/// Handler for restoring a snapshot. The whole file is migrated and
/// structurally validated before the first destructive write; a snapshot
/// that fails any check leaves the namespace exactly as it was. The swap
/// itself runs in one transaction.
pub async fn import_backup(
    State(store): State<Store>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let Value::Object(snapshot) = body else {
        return Err(BackupError::Invalid {
            reason: "snapshot must be a JSON object".to_string(),
        }
        .into());
    };

    let snapshot = migrate_snapshot(snapshot)?;
    let entries = validate_snapshot(&snapshot)?;

    let _guard = store.lock_writes().await;
    store.replace_namespace(&entries).await?;

    info!("Backup imported ({} keys restored).", entries.len());
    Ok(Json(json!({
        "message": format!("Successfully restored {} keys.", entries.len()),
        "keysRestored": entries.len(),
    })))
}

fn migrate_snapshot(mut snapshot: Map<String, Value>) -> Result<Map<String, Value>, BackupError> {
    let mut version = snapshot
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if version > SNAPSHOT_VERSION {
        return Err(BackupError::UnsupportedVersion { version });
    }
    while version < SNAPSHOT_VERSION {
        let (_, migration) = MIGRATIONS
            .iter()
            .find(|(from, _)| *from == version)
            .ok_or(BackupError::UnsupportedVersion { version })?;
        snapshot = migration(snapshot)?;
        version += 1;
    }
    Ok(snapshot)
}

/// Checks every value of the snapshot against the shape the store would
/// need on the next load. Returns the entries to restore; the version
/// field itself is not stored.
fn validate_snapshot(snapshot: &Map<String, Value>) -> Result<Vec<(String, String)>, BackupError> {
    let mut entries = Vec::new();
    for (key, value) in snapshot {
        if key == "schemaVersion" {
            continue;
        }

        let Value::String(raw) = value else {
            return Err(BackupError::Invalid {
                reason: format!("value for `{key}` must be a string"),
            });
        };

        let check = match key.as_str() {
            CLIENTS => serde_json::from_str::<Vec<Client>>(raw).map(|_| ()),
            QUOTES => serde_json::from_str::<Vec<Quote>>(raw).map(|_| ()),
            JOBS => serde_json::from_str::<Vec<Job>>(raw).map(|_| ()),
            // Unknown string keys (the daily marker among them) restore
            // verbatim.
            _ => Ok(()),
        };
        if let Err(error) = check {
            return Err(BackupError::Invalid {
                reason: format!("`{key}` does not parse as a valid collection: {error}"),
            });
        }

        entries.push((key.clone(), raw.clone()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_legacy_snapshot_migrates_to_current_version() {
        let legacy = snapshot_with(&[("clients", json!("[]"))]);

        let migrated = migrate_snapshot(legacy).unwrap();
        assert_eq!(
            migrated.get("schemaVersion").and_then(Value::as_u64),
            Some(SNAPSHOT_VERSION)
        );
    }

    #[test]
    fn test_future_version_is_rejected() {
        let future = snapshot_with(&[("schemaVersion", json!(99))]);

        let err = migrate_snapshot(future).unwrap_err();
        assert!(matches!(err, BackupError::UnsupportedVersion { version: 99 }));
    }

    #[test]
    fn test_collection_values_must_be_strings() {
        let snapshot = snapshot_with(&[("clients", json!([]))]);

        let err = validate_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn test_malformed_collection_fails_validation() {
        let snapshot = snapshot_with(&[("jobs", json!("{not json"))]);

        let err = validate_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().contains("jobs"));
    }

    #[test]
    fn test_valid_snapshot_yields_entries_without_the_version_field() {
        let snapshot = snapshot_with(&[
            ("schemaVersion", json!(1)),
            ("clients", json!("[]")),
            ("lastDailyNotificationScheduled", json!("2024-03-01")),
        ]);

        let entries = validate_snapshot(&snapshot).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|(key, _)| key != "schemaVersion"));
    }
}
