//! Credential conversion errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Error processing credential: {0}")]
    Malformed(String),

    #[error("Invalid credential format: must be an array")]
    NotAnArray,

    #[error("Invalid credential: missing '{0}' entry")]
    MissingKey(String),
}
