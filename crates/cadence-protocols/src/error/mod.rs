//! Error types for the protocol layer.

mod credential;
mod remote;

pub use credential::*;
pub use remote::*;
