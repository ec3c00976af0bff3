//! Domain model structs persisted as JSON documents in local storage.
//!
//! Field names are serialized in camelCase so stored documents keep the
//! shape the web front-end reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use workit_shared::types::{ConversationId, MessageId, PaymentMethodId, TransactionId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A marketplace account. Exactly one is "current" per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Display name.
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    /// Avatar as a `data:` URI or a remote URL.
    #[serde(
        rename = "profilePicture",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_freelancer: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A two-party message thread keyed by an unordered participant pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: [UserId; 2],
    /// Usually the related service or order name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Copy of the newest message, kept for list rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
}

impl Conversation {
    pub fn involves(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// True when the participants are exactly `a` and `b`, in either order.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        let [x, y] = &self.participants;
        (x == a && y == b) || (x == b && y == a)
    }

    /// The participant that is not `user`, or `None` if `user` is not part
    /// of this conversation.
    pub fn other_participant(&self, user: &UserId) -> Option<&UserId> {
        let [x, y] = &self.participants;
        if x == user {
            Some(y)
        } else if y == user {
            Some(x)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

// ---------------------------------------------------------------------------
// Payment method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    CreditCard,
    Paypal,
    BankTransfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    /// Last four card digits (credit cards only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    /// Card expiry as `MM/YY` (credit cards only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    pub name: String,
    pub is_default: bool,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// A purchase record. Service fields are a snapshot taken at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub service_id: String,
    pub service_name: String,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub payment_method_id: PaymentMethodId,
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
}
