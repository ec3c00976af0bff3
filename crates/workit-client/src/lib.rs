//! # workit-client
//!
//! Client-side state for the Workit marketplace: the user session,
//! conversations with clients, and the payment ledger.  Everything is kept
//! in memory and mirrored to local storage provided by `workit-store`.

pub mod avatar;
pub mod config;
pub mod error;
pub mod gateway;
pub mod persist;
pub mod state;
pub mod stores;

mod seed;

#[cfg(test)]
mod test_utils;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::AppState;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("workit_client=debug,workit_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
