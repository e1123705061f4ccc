// 🗄️ Flat Collection Store - one JSON array per collection name
//
// Every write replaces a whole collection in a single statement, so each
// collection is atomic on its own. There is NO atomicity across collections.
//
// Reads never fail the caller: an absent or unreadable collection degrades
// to an empty one (logged), and the engines then compute over nothing.

use crate::entities::{Employee, Expense, Partner, Reservation, Withdrawal};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::RwLock;

// ============================================================================
// STORE CONTRACT
// ============================================================================

pub trait CollectionStore {
    /// Raw JSON stored under `key`, or None if nothing was ever written
    fn read_raw(&self, key: &str) -> Result<Option<String>>;

    /// Replace whatever is stored under `key`
    fn write_raw(&self, key: &str, json: &str) -> Result<()>;

    /// Every key that currently holds data
    fn keys(&self) -> Result<Vec<String>>;
}

// ============================================================================
// TYPED COLLECTIONS
// ============================================================================

/// Typed handle on one named collection
pub struct Collection<T> {
    name: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Collection<T> {
    pub const fn new(name: &'static str) -> Self {
        Collection {
            name,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    /// Load every record; absent or corrupt data yields an empty Vec
    pub fn load<S: CollectionStore + ?Sized>(&self, store: &S) -> Vec<T> {
        match store.read_raw(self.name) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(collection = self.name, error = %e, "unreadable collection, treating as empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(collection = self.name, error = %e, "store read failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Load for a read-modify-write cycle
    ///
    /// Unlike `load`, stored data that does not parse is an error, so a
    /// degraded read is never saved back over the original records.
    pub fn load_for_update<S: CollectionStore + ?Sized>(&self, store: &S) -> Result<Vec<T>> {
        match store.read_raw(self.name)? {
            Some(json) => serde_json::from_str(&json).with_context(|| {
                format!(
                    "Collection '{}' holds unreadable data; refusing to overwrite it",
                    self.name
                )
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the collection with `records`
    pub fn save<S: CollectionStore + ?Sized>(&self, store: &S, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)
            .with_context(|| format!("Failed to serialize collection '{}'", self.name))?;
        store.write_raw(self.name, &json)?;
        tracing::debug!(collection = self.name, records = records.len(), "collection saved");
        Ok(())
    }
}

pub const PARTNERS: Collection<Partner> = Collection::new("partners");
pub const WITHDRAWALS: Collection<Withdrawal> = Collection::new("withdrawals");
pub const RESERVATIONS: Collection<Reservation> = Collection::new("reservations");
pub const EXPENSES: Collection<Expense> = Collection::new("expenses");
pub const EMPLOYEES: Collection<Employee> = Collection::new("employees");

/// Key of the venue settings document
pub const SETTINGS_KEY: &str = "settings";

/// Every key included in backups
pub const ALL_KEYS: [&str; 6] = [
    "partners",
    "withdrawals",
    "reservations",
    "expenses",
    "employees",
    SETTINGS_KEY,
];

/// Load a single JSON document (not an array); None if absent or unreadable
pub fn load_document<T: DeserializeOwned, S: CollectionStore + ?Sized>(store: &S, key: &str) -> Option<T> {
    let json = match store.read_raw(key) {
        Ok(json) => json?,
        Err(e) => {
            tracing::warn!(key, error = %e, "store read failed");
            return None;
        }
    };

    serde_json::from_str(&json)
        .map_err(|e| tracing::warn!(key, error = %e, "unreadable document"))
        .ok()
}

pub fn save_document<T: Serialize, S: CollectionStore + ?Sized>(store: &S, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).with_context(|| format!("Failed to serialize '{}'", key))?;
    store.write_raw(key, &json)
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    /// When a collection was last written (RFC 3339)
    pub fn updated_at(&self, key: &str) -> Result<Option<String>> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM collections WHERE name = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl CollectionStore for SqliteStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .conn
            .query_row(
                "SELECT data FROM collections WHERE name = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read collection '{}'", key))?;
        Ok(data)
    }

    fn write_raw(&self, key: &str, json: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO collections (name, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![key, json, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to write collection '{}'", key))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(data.get(key).cloned())
    }

    fn write_raw(&self, key: &str, json: &str) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        data.insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        let mut keys: Vec<String> = data.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PartnerInput;

    fn sample_partners() -> Vec<Partner> {
        vec![
            Partner::new(PartnerInput::percentage("A", "Manager", 60.0, 60_000.0)),
            Partner::new(PartnerInput::shares("B", "Investor", 400, 100.0)),
        ]
    }

    #[test]
    fn test_sqlite_collection_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let partners = sample_partners();

        PARTNERS.save(&store, &partners).unwrap();
        assert_eq!(PARTNERS.load(&store), partners);
        assert!(store.updated_at("partners").unwrap().is_some());
    }

    #[test]
    fn test_save_replaces_whole_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        let partners = sample_partners();

        PARTNERS.save(&store, &partners).unwrap();
        PARTNERS.save(&store, &partners[1..]).unwrap();

        let loaded = PARTNERS.load(&store);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "B");
    }

    #[test]
    fn test_absent_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(WITHDRAWALS.load(&store).is_empty());
    }

    #[test]
    fn test_corrupt_collection_degrades_to_empty() {
        let store = MemoryStore::new();
        store.write_raw("partners", "{not json").unwrap();
        assert!(PARTNERS.load(&store).is_empty());

        store.write_raw("reservations", r#"[{"renterName": "no amount"}]"#).unwrap();
        assert!(RESERVATIONS.load(&store).is_empty());
    }

    #[test]
    fn test_load_for_update_refuses_unreadable_data() {
        let store = MemoryStore::new();
        assert!(PARTNERS.load_for_update(&store).unwrap().is_empty());

        store.write_raw("partners", r#"[{"id": "a", "name": 7}]"#).unwrap();
        let err = PARTNERS.load_for_update(&store).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));

        PARTNERS.save(&store, &sample_partners()).unwrap();
        assert_eq!(PARTNERS.load_for_update(&store).unwrap().len(), 2);
    }

    #[test]
    fn test_employees_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        let employees = vec![Employee {
            id: "e1".to_string(),
            name: "Samir".to_string(),
            position: "Guard".to_string(),
            salary: 60_000.0,
            hire_date: "2023-04-01".to_string(),
        }];

        EMPLOYEES.save(&store, &employees).unwrap();
        assert_eq!(EMPLOYEES.load(&store), employees);
    }

    #[test]
    fn test_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        EXPENSES.save(&store, &[]).unwrap();
        PARTNERS.save(&store, &sample_partners()).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["expenses".to_string(), "partners".to_string()]);
    }

    #[test]
    fn test_documents() {
        let store = MemoryStore::new();
        assert!(load_document::<serde_json::Value, _>(&store, "settings").is_none());

        save_document(&store, "settings", &serde_json::json!({"currency": "YER"})).unwrap();
        let doc: serde_json::Value = load_document(&store, "settings").unwrap();
        assert_eq!(doc["currency"], "YER");
    }

    #[test]
    fn test_sqlite_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venue.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            PARTNERS.save(&store, &sample_partners()).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(PARTNERS.load(&reopened).len(), 2);
    }
}
