//! # workit-shared
//!
//! Types shared by the storage layer and the client stores: identifier
//! newtypes, storage keys and limits, and input validation.

pub mod constants;
pub mod error;
pub mod types;
pub mod validation;

pub use error::ValidationError;
