use thiserror::Error;
use workit_shared::types::TransactionId;
use workit_shared::ValidationError;
use workit_store::StoreError;

/// Failures surfaced by store operations.
///
/// Every variant is returned before any in-memory state changes, except
/// [`ClientError::PaymentDeclined`], whose failed transaction is kept in the
/// history on purpose.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No user is logged in")]
    Unauthenticated,

    #[error("Cannot remove the only payment method")]
    LastMethod,

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("No default payment method found")]
    NoDefaultMethod,

    #[error("Payment declined: {reason}")]
    PaymentDeclined {
        transaction_id: TransactionId,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ClientError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
