//! # workit-store
//!
//! Durable local storage for the Workit client, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`.  Data lives in a single key/value table, one JSON
//! document per key, the way a browser's local storage would hold it.  The
//! domain models stored in those documents live in [`models`].

pub mod backup;
pub mod database;
pub mod local_storage;
pub mod migrations;
pub mod models;

mod error;

pub use backup::StorageSnapshot;
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
