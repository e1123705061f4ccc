// 💾 Backup & Restore - JSON dump of every raw collection
//
// The checksum is SHA-256 over the canonical (key-sorted) collections map, so
// a hand-edited or truncated backup is refused before anything is written.

use crate::store::{CollectionStore, ALL_KEYS};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

pub const BACKUP_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub collections: BTreeMap<String, Value>,
    pub checksum: String,
}

fn checksum(collections: &BTreeMap<String, Value>) -> Result<String> {
    let canonical = serde_json::to_string(collections)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

impl Backup {
    pub fn verify(&self) -> Result<()> {
        if self.format_version != BACKUP_FORMAT_VERSION {
            bail!("Unsupported backup format version {}", self.format_version);
        }
        if checksum(&self.collections)? != self.checksum {
            bail!("Backup checksum mismatch - file is corrupt or was edited");
        }
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write backup {}", path.display()))
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read backup {}", path.display()))?;
        serde_json::from_str(&json).context("Backup file is not valid JSON")
    }
}

/// Snapshot every known collection (unreadable ones are skipped)
pub fn export<S: CollectionStore + ?Sized>(store: &S) -> Result<Backup> {
    let mut collections = BTreeMap::new();

    for key in ALL_KEYS {
        let Some(raw) = store.read_raw(key)? else {
            continue;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                collections.insert(key.to_string(), value);
            }
            Err(e) => tracing::warn!(collection = key, error = %e, "skipping unreadable collection in backup"),
        }
    }

    let checksum = checksum(&collections)?;
    tracing::info!(collections = collections.len(), "backup exported");

    Ok(Backup {
        format_version: BACKUP_FORMAT_VERSION,
        exported_at: Utc::now(),
        collections,
        checksum,
    })
}

/// Verify and write every collection in the backup; returns how many were restored
///
/// Each collection is written on its own; there is no cross-collection rollback.
pub fn restore<S: CollectionStore + ?Sized>(store: &S, backup: &Backup) -> Result<usize> {
    backup.verify()?;

    let mut restored = 0;
    for (key, value) in &backup.collections {
        if !ALL_KEYS.contains(&key.as_str()) {
            tracing::warn!(collection = %key, "ignoring unknown collection in backup");
            continue;
        }
        store.write_raw(key, &serde_json::to_string(value)?)?;
        restored += 1;
    }

    tracing::info!(restored, "backup restored");
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Employee, Partner, PartnerInput};
    use crate::settings::Settings;
    use crate::store::{MemoryStore, SqliteStore, EMPLOYEES, PARTNERS};

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        PARTNERS
            .save(&store, &[Partner::new(PartnerInput::shares("B", "Investor", 400, 100.0))])
            .unwrap();
        EMPLOYEES
            .save(&store, &[Employee {
                id: "e1".to_string(),
                name: "Samir".to_string(),
                position: "Guard".to_string(),
                salary: 60_000.0,
                hire_date: "2023-04-01".to_string(),
            }])
            .unwrap();
        Settings::new("Hall", "YER", "admin", "pw").save(&store).unwrap();
        store
    }

    #[test]
    fn test_export_and_restore_into_fresh_store() {
        let source = seeded_store();
        let backup = export(&source).unwrap();
        assert_eq!(backup.collections.len(), 3);

        let target = SqliteStore::open_in_memory().unwrap();
        assert_eq!(restore(&target, &backup).unwrap(), 3);
        assert_eq!(PARTNERS.load(&target), PARTNERS.load(&source));
        assert_eq!(EMPLOYEES.load(&target)[0].name, "Samir");
        assert!(Settings::load(&target).is_some());
    }

    #[test]
    fn test_tampered_backup_is_refused() {
        let mut backup = export(&seeded_store()).unwrap();
        backup
            .collections
            .insert("expenses".to_string(), serde_json::json!([{"amount": 1}]));

        let target = MemoryStore::new();
        assert!(restore(&target, &backup).is_err());
        assert!(target.keys().unwrap().is_empty());
    }

    #[test]
    fn test_backup_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let backup = export(&seeded_store()).unwrap();
        backup.write_to(&path).unwrap();

        let read = Backup::read_from(&path).unwrap();
        assert!(read.verify().is_ok());
        assert_eq!(read.checksum, backup.checksum);
    }
}
