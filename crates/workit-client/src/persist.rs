//! JSON mirroring between the stores and local storage.
//!
//! Reads never fail: a missing key is `None`, and a value that no longer
//! parses is logged, removed and treated as missing.  Writes are
//! fire-and-forget: failures are logged, the in-memory state stays
//! authoritative.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use workit_store::Database;

/// Database handle shared by every store.
pub type SharedDatabase = Arc<Mutex<Database>>;

pub fn shared(db: Database) -> SharedDatabase {
    Arc::new(Mutex::new(db))
}

// Every write is a single statement, so a panic elsewhere cannot leave the
// connection half-updated.
pub(crate) fn lock(db: &SharedDatabase) -> MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn load_json<T: DeserializeOwned>(db: &SharedDatabase, key: &str) -> Option<T> {
    let guard = lock(db);

    let raw = match guard.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::error!(key, error = %e, "failed to read local storage");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt stored value");
            if let Err(e) = guard.remove_item(key) {
                tracing::error!(key, error = %e, "failed to remove corrupt value");
            }
            None
        }
    }
}

pub(crate) fn save_json<T: Serialize + ?Sized>(db: &SharedDatabase, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(key, error = %e, "failed to serialize value for local storage");
            return;
        }
    };

    if let Err(e) = lock(db).set_item(key, &json) {
        tracing::error!(key, error = %e, "failed to write local storage");
    }
}

pub(crate) fn remove_key(db: &SharedDatabase, key: &str) {
    if let Err(e) = lock(db).remove_item(key) {
        tracing::error!(key, error = %e, "failed to remove local storage key");
    }
}

pub(crate) fn has_key(db: &SharedDatabase, key: &str) -> bool {
    matches!(lock(db).get_item(key), Ok(Some(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> SharedDatabase {
        shared(Database::open_in_memory().unwrap())
    }

    #[test]
    fn save_then_load() {
        let db = db();
        save_json(&db, "numbers", &vec![1, 2, 3]);
        assert_eq!(load_json::<Vec<i32>>(&db, "numbers"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn corrupt_value_is_discarded() {
        let db = db();
        lock(&db).set_item("numbers", "[1, 2,").unwrap();

        assert_eq!(load_json::<Vec<i32>>(&db, "numbers"), None);
        assert!(!has_key(&db, "numbers"));
    }

    #[test]
    fn wrong_shape_is_discarded() {
        let db = db();
        lock(&db).set_item("numbers", r#"{"a":1}"#).unwrap();

        assert_eq!(load_json::<Vec<i32>>(&db, "numbers"), None);
        assert!(!has_key(&db, "numbers"));
    }

    #[test]
    fn remove_key_is_idempotent() {
        let db = db();
        save_json(&db, "k", &true);
        remove_key(&db, "k");
        remove_key(&db, "k");
        assert!(!has_key(&db, "k"));
    }
}
