//! Shared fixtures for the store tests.

use std::sync::{Arc, Once};
use std::time::Duration;

use workit_store::Database;

use crate::gateway::SimulatedGateway;
use crate::persist::{self, SharedDatabase};
use crate::stores::ledger::LedgerStore;
use crate::stores::messaging::ConversationStore;
use crate::stores::session::{RegisterDraft, SessionStore};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("workit_client=debug,workit_store=debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn memory_db() -> SharedDatabase {
    init_test_tracing();
    persist::shared(Database::open_in_memory().unwrap())
}

pub fn session(db: &SharedDatabase) -> Arc<SessionStore> {
    Arc::new(SessionStore::open(db.clone(), 1024 * 1024))
}

/// A session with "Jean Dupont" already registered.
pub fn logged_in_session(db: &SharedDatabase) -> Arc<SessionStore> {
    let session = session(db);
    session
        .register(RegisterDraft {
            name: Some("Jean Dupont".into()),
            email: Some("jean@x.com".into()),
            ..Default::default()
        })
        .unwrap();
    session
}

pub fn conversations(db: &SharedDatabase, session: &Arc<SessionStore>) -> ConversationStore {
    ConversationStore::open(db.clone(), session.clone())
}

pub fn ledger(db: &SharedDatabase, session: &Arc<SessionStore>) -> LedgerStore {
    LedgerStore::open(
        db.clone(),
        session.clone(),
        Arc::new(SimulatedGateway::new(Duration::ZERO)),
        "TND".into(),
    )
}

/// A small, valid PNG.
pub fn png_bytes() -> Vec<u8> {
    png_bytes_sized(8, 8)
}

pub fn png_bytes_sized(width: u32, height: u32) -> Vec<u8> {
    use image::{ImageBuffer, Rgb};
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 30) as u8, (y * 30) as u8, (x ^ y) as u8])
    });
    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
    buf
}
