//! Domain stores.
//!
//! Each store owns one slice of client state, hydrates it from local
//! storage when opened and writes it back after every mutation.  Stores
//! that need the logged-in user receive a [`session::SessionAccessor`].

pub mod ledger;
pub mod messaging;
pub mod session;
