use thiserror::Error;

/// Malformed or missing input, rejected before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Card last digits must be exactly 4 digits")]
    InvalidLast4,

    #[error("Card expiry must use the MM/YY format")]
    InvalidExpiry,

    #[error("Amount must be a positive, finite number")]
    InvalidAmount,

    #[error("Message content cannot be empty")]
    EmptyMessage,

    #[error("A conversation needs two distinct participants")]
    SelfConversation,

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },
}
