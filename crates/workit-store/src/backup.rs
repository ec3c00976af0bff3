use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;

/// Full local storage dump, one parsed JSON document per key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSnapshot {
    /// ISO 8601 timestamp of when the snapshot was taken
    pub created_at: String,
    /// App version that produced the snapshot
    pub version: String,
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl Database {
    /// Dump every stored key.  Values that are not valid JSON are skipped.
    pub fn export_snapshot(&self) -> Result<StorageSnapshot> {
        let mut entries = BTreeMap::new();

        for key in self.keys()? {
            let Some(raw) = self.get_item(&key)? else {
                continue;
            };
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    entries.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping corrupt value in snapshot");
                }
            }
        }

        Ok(StorageSnapshot {
            created_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            entries,
        })
    }

    /// Replace the whole local storage with the snapshot contents.
    ///
    /// Runs in a single SQLite transaction: either every entry is restored
    /// or nothing changes.  Returns the number of entries written.
    pub fn import_snapshot(&mut self, snapshot: &StorageSnapshot) -> Result<usize> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn_mut().transaction()?;

        tx.execute("DELETE FROM local_storage", [])?;
        for (key, value) in &snapshot.entries {
            let json = serde_json::to_string(value)?;
            tx.execute(
                "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, json, now],
            )?;
        }
        tx.commit()?;

        tracing::info!(
            entries = snapshot.entries.len(),
            snapshot_created_at = %snapshot.created_at,
            "local storage restored from snapshot"
        );

        Ok(snapshot.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_then_import_into_fresh_database() {
        let source = Database::open_in_memory().unwrap();
        source.set_item("payment_methods_store", r#"[{"id":"pm_1"}]"#).unwrap();
        source.set_item("session_user", r#"{"id":"user_1"}"#).unwrap();

        let snapshot = source.export_snapshot().unwrap();
        assert_eq!(snapshot.entries.len(), 2);

        let mut target = Database::open_in_memory().unwrap();
        target.set_item("stale", "true").unwrap();
        assert_eq!(target.import_snapshot(&snapshot).unwrap(), 2);

        assert!(target.get_item("stale").unwrap().is_none());
        let restored: serde_json::Value =
            serde_json::from_str(&target.get_item("payment_methods_store").unwrap().unwrap())
                .unwrap();
        assert_eq!(restored[0]["id"], "pm_1");
    }

    #[test]
    fn corrupt_values_are_left_out() {
        let db = Database::open_in_memory().unwrap();
        db.set_item("good", "[]").unwrap();
        db.set_item("bad", "{not json").unwrap();

        let snapshot = db.export_snapshot().unwrap();
        assert!(snapshot.entries.contains_key("good"));
        assert!(!snapshot.entries.contains_key("bad"));
    }
}
