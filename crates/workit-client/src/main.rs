use anyhow::Context;
use tracing::info;

use workit_client::{init_tracing, AppState, ClientConfig};
use workit_shared::constants::APP_NAME;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::from_env();
    info!(
        db_path = ?config.db_path,
        currency = %config.currency,
        seed_demo = config.seed_demo,
        "Starting {APP_NAME} client"
    );

    let state = AppState::open(config).context("Failed to open local storage")?;

    if state.config.seed_demo {
        match state.seed_demo_data() {
            Ok(true) => info!("Demo data seeded"),
            Ok(false) => info!("Existing data found, demo seed skipped"),
            Err(e) => tracing::warn!(error = %e, "Demo seed skipped"),
        }
    }

    match state.session.current_user() {
        Some(user) => info!(
            user_id = %user.id,
            name = %user.name,
            conversations = state.conversations.list_conversations().len(),
            unread = state.conversations.unread_count(),
            payment_methods = state.ledger.payment_methods().len(),
            transactions = state.ledger.transactions_for_user(&user.id).len(),
            "Session restored"
        ),
        None => info!("No user logged in"),
    }

    Ok(())
}
