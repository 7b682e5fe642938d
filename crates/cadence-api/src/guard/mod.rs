//! Guard sessions.
//!
//! Stored credentials for the profile guard feature. Plain CRUD, no
//! scheduling attached.

pub mod routes;
mod session;
mod store;

pub use session::GuardSession;
pub use store::GuardSessionStore;
