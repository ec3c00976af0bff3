use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ORDER_NUMBER_MAX, ORDER_NUMBER_MIN};

// Identifiers are opaque strings with a readable prefix (`user_…`, `conv_…`).
// Seed data uses fixed ids such as `conv_1`, so parsing never rejects a value.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random id carrying the type's prefix.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, short_token()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identity of a marketplace user (client or freelancer).
    UserId,
    "user"
);
string_id!(
    /// Identity of a two-party conversation.
    ConversationId,
    "conv"
);
string_id!(MessageId, "msg");
string_id!(PaymentMethodId, "pm");
string_id!(TransactionId, "tx");

/// Twelve lowercase hex characters taken from a v4 UUID.
fn short_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(12);
    token
}

/// `ORD-NNNN` reference handed to the buyer after checkout.
pub fn generate_order_id() -> String {
    let n = rand::thread_rng().gen_range(ORDER_NUMBER_MIN..=ORDER_NUMBER_MAX);
    format!("ORD-{n}")
}
