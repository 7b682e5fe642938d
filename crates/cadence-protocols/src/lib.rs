//! # Cadence Protocols
//!
//! Interface definitions for the external service Cadence drives.
//! Contains only the seams and the types crossing them - no transport code.
//!
//! ## Core Traits
//!
//! - [`ContentResolver`] - Maps a target URL to a content id and a credential to a bearer token
//! - [`Publisher`] - Performs one remote write against a resolved content id

pub mod credential;
pub mod error;
pub mod remote;

pub use credential::{CredentialEntry, CredentialJar};
pub use error::{CredentialError, RemoteError};
pub use remote::{ContentResolver, Publisher};
