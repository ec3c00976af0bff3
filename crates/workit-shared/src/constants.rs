/// Application name
pub const APP_NAME: &str = "Workit";

/// Local storage key holding the serialized current user
pub const KEY_SESSION_USER: &str = "session_user";

/// Local storage key holding the array of conversations
pub const KEY_CONVERSATIONS: &str = "conversations_store";

/// Local storage key holding the conversationId -> messages map
pub const KEY_MESSAGES: &str = "messages_store";

/// Local storage key holding the array of payment methods
pub const KEY_PAYMENT_METHODS: &str = "payment_methods_store";

/// Local storage key holding the transaction history
pub const KEY_TRANSACTIONS: &str = "transactions_store";

/// Every key owned by the stores, in snapshot order
pub const ALL_STORAGE_KEYS: [&str; 5] = [
    KEY_SESSION_USER,
    KEY_CONVERSATIONS,
    KEY_MESSAGES,
    KEY_PAYMENT_METHODS,
    KEY_TRANSACTIONS,
];

/// Currency recorded on transactions unless configured otherwise
pub const DEFAULT_CURRENCY: &str = "TND";

/// Simulated payment gateway latency in milliseconds
pub const DEFAULT_PAYMENT_DELAY_MS: u64 = 1_000;

/// Maximum avatar upload size in bytes (5 MiB)
pub const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// Order numbers are `ORD-` followed by a number in this range
pub const ORDER_NUMBER_MIN: u32 = 1_000;
pub const ORDER_NUMBER_MAX: u32 = 9_999;
