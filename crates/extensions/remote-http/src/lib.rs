//! HTTP adapters for Cadence.
//!
//! Implements [`ContentResolver`](cadence_protocols::ContentResolver) and
//! [`Publisher`](cadence_protocols::Publisher) on top of a shared reqwest client.

mod remote;

pub use remote::{HttpRemote, HttpRemoteError, HttpRemoteSettings};
