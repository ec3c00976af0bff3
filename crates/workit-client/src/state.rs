//! Application state shared by every caller.
//!
//! [`AppState`] opens local storage once and hands the same database handle
//! and session to each store.

use std::sync::Arc;

use workit_store::{Database, StorageSnapshot};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::gateway::{PaymentGateway, SimulatedGateway};
use crate::persist::{self, SharedDatabase};
use crate::stores::ledger::LedgerStore;
use crate::stores::messaging::ConversationStore;
use crate::stores::session::SessionStore;

/// Central application state.
pub struct AppState {
    /// Settings the stores were built with.
    pub config: ClientConfig,

    /// Local storage shared by all stores.
    pub database: SharedDatabase,

    /// The logged-in user. Also serves as the session accessor of the
    /// other two stores.
    pub session: Arc<SessionStore>,

    pub conversations: ConversationStore,

    pub ledger: LedgerStore,

    gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Open local storage at the configured location and hydrate every store.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let db = match &config.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Database, config: ClientConfig) -> Self {
        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(SimulatedGateway::new(config.payment_delay));
        Self::with_gateway(db, config, gateway)
    }

    /// Same as [`AppState::with_database`] with a custom payment gateway.
    pub fn with_gateway(db: Database, config: ClientConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        let database = persist::shared(db);
        let (session, conversations, ledger) = build_stores(&database, &config, &gateway);

        Self {
            config,
            database,
            session,
            conversations,
            ledger,
            gateway,
        }
    }

    /// Seed demo conversations and ledger entries for the current user.
    /// Returns whether anything was written.
    pub fn seed_demo_data(&self) -> Result<bool> {
        let conversations = self.conversations.seed_demo_data()?;
        let ledger = self.ledger.seed_demo_data()?;
        Ok(conversations || ledger)
    }

    pub fn export_snapshot(&self) -> Result<StorageSnapshot> {
        Ok(persist::lock(&self.database).export_snapshot()?)
    }

    /// Replace local storage with `snapshot` and re-hydrate every store.
    pub fn import_snapshot(&mut self, snapshot: &StorageSnapshot) -> Result<usize> {
        let restored = persist::lock(&self.database).import_snapshot(snapshot)?;

        let (session, conversations, ledger) =
            build_stores(&self.database, &self.config, &self.gateway);
        self.session = session;
        self.conversations = conversations;
        self.ledger = ledger;

        tracing::info!(entries = restored, "local storage restored from snapshot");
        Ok(restored)
    }
}

fn build_stores(
    database: &SharedDatabase,
    config: &ClientConfig,
    gateway: &Arc<dyn PaymentGateway>,
) -> (Arc<SessionStore>, ConversationStore, LedgerStore) {
    let session = Arc::new(SessionStore::open(database.clone(), config.max_avatar_bytes));
    let conversations = ConversationStore::open(database.clone(), session.clone());
    let ledger = LedgerStore::open(
        database.clone(),
        session.clone(),
        gateway.clone(),
        config.currency.clone(),
    );
    (session, conversations, ledger)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use workit_shared::constants::ALL_STORAGE_KEYS;
    use workit_shared::types::UserId;

    use super::*;
    use crate::stores::session::{RegisterDraft, SessionAccessor};
    use crate::test_utils::init_test_tracing;

    fn state() -> AppState {
        init_test_tracing();
        let config = ClientConfig {
            payment_delay: Duration::ZERO,
            ..ClientConfig::default()
        };
        AppState::with_database(Database::open_in_memory().unwrap(), config)
    }

    fn register(state: &AppState) {
        state
            .session
            .register(RegisterDraft {
                name: Some("Jean Dupont".into()),
                email: Some("jean@x.com".into()),
                ..Default::default()
            })
            .unwrap();
    }

    #[test]
    fn stores_share_the_session() {
        let state = state();
        assert!(state.conversations.list_conversations().is_empty());

        register(&state);
        assert!(state.seed_demo_data().unwrap());
        assert_eq!(state.conversations.list_conversations().len(), 3);
        assert_eq!(state.ledger.payment_methods().len(), 2);

        assert!(!state.seed_demo_data().unwrap());
    }

    #[tokio::test]
    async fn snapshot_round_trip_restores_every_store() {
        let mut state = state();
        register(&state);
        state.seed_demo_data().unwrap();
        state
            .conversations
            .start_conversation(&UserId::from("client_4"), Some("Traduction"))
            .unwrap();
        state
            .ledger
            .process_payment("svc_4", "Traduction", 60.0, None)
            .await
            .unwrap();

        let snapshot = state.export_snapshot().unwrap();
        for key in ALL_STORAGE_KEYS {
            assert!(snapshot.entries.contains_key(key), "missing {key}");
        }

        let user = state.session.current_user();
        let conversations = state.conversations.list_conversations();
        let methods = state.ledger.payment_methods();
        let transactions = state.ledger.transactions();

        // Diverge, then restore.
        state.session.logout();
        state
            .ledger
            .add_payment_method(crate::stores::ledger::PaymentMethodDraft {
                kind: workit_store::PaymentKind::Paypal,
                last4: None,
                expiry_date: None,
                name: Some("Extra".into()),
                is_default: true,
            })
            .unwrap();

        let restored = state.import_snapshot(&snapshot).unwrap();
        assert_eq!(restored, ALL_STORAGE_KEYS.len());

        assert_eq!(state.session.current_user(), user);
        assert_eq!(
            state.session.current_user_id(),
            user.as_ref().map(|u| u.id.clone())
        );
        assert_eq!(state.conversations.list_conversations(), conversations);
        assert_eq!(state.ledger.payment_methods(), methods);
        assert_eq!(state.ledger.transactions(), transactions);
    }

    #[test]
    fn open_uses_configured_path() {
        init_test_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            db_path: Some(dir.path().join("workit.db")),
            ..ClientConfig::default()
        };

        {
            let state = AppState::open(config.clone()).unwrap();
            register(&state);
        }

        let state = AppState::open(config).unwrap();
        assert_eq!(state.session.current_user().unwrap().name, "Jean Dupont");
    }
}
