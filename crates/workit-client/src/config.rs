//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use workit_shared::constants::{DEFAULT_CURRENCY, DEFAULT_PAYMENT_DELAY_MS, MAX_AVATAR_SIZE};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Database file holding local storage.
    /// Env: `WORKIT_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,

    /// Latency of the simulated payment gateway.
    /// Env: `WORKIT_PAYMENT_DELAY_MS`
    /// Default: 1000 ms
    pub payment_delay: Duration,

    /// Currency recorded on new transactions.
    /// Env: `WORKIT_CURRENCY`
    /// Default: `"TND"`
    pub currency: String,

    /// Seed demo conversations and ledger entries at startup.
    /// Env: `WORKIT_SEED_DEMO` (true/false)
    /// Default: `false`
    pub seed_demo: bool,

    /// Largest accepted avatar upload in bytes.
    /// Env: `WORKIT_MAX_AVATAR_BYTES`
    /// Default: 5 MiB
    pub max_avatar_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            payment_delay: Duration::from_millis(DEFAULT_PAYMENT_DELAY_MS),
            currency: DEFAULT_CURRENCY.to_string(),
            seed_demo: false,
            max_avatar_bytes: MAX_AVATAR_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("WORKIT_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("WORKIT_PAYMENT_DELAY_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.payment_delay = Duration::from_millis(ms),
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid WORKIT_PAYMENT_DELAY_MS, using default"
                ),
            }
        }

        if let Some(currency) = lookup("WORKIT_CURRENCY") {
            let currency = currency.trim().to_uppercase();
            if !currency.is_empty() {
                config.currency = currency;
            }
        }

        if let Some(val) = lookup("WORKIT_SEED_DEMO") {
            config.seed_demo = val == "true" || val == "1";
        }

        if let Some(val) = lookup("WORKIT_MAX_AVATAR_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_avatar_bytes = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid WORKIT_MAX_AVATAR_BYTES, using default"
                ),
            }
        }

        config
    }
}
