//! Credential blob conversion.
//!
//! Callers hand over their session as a JSON array of `{ "key", "value" }`
//! entries. The external service wants a single cookie header instead.

use serde::Deserialize;

use crate::error::CredentialError;

/// One entry of a credential blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialEntry {
    pub key: String,
    pub value: String,
}

/// A parsed credential blob.
#[derive(Debug, Clone)]
pub struct CredentialJar {
    entries: Vec<CredentialEntry>,
    required_key: String,
}

impl CredentialJar {
    /// Parse a credential blob, requiring an entry named `required_key`.
    pub fn parse(blob: &str, required_key: &str) -> Result<Self, CredentialError> {
        let value: serde_json::Value =
            serde_json::from_str(blob).map_err(|e| CredentialError::Malformed(e.to_string()))?;

        if !value.is_array() {
            return Err(CredentialError::NotAnArray);
        }

        let entries: Vec<CredentialEntry> =
            serde_json::from_value(value).map_err(|e| CredentialError::Malformed(e.to_string()))?;

        if !entries.iter().any(|e| e.key == required_key) {
            return Err(CredentialError::MissingKey(required_key.to_string()));
        }

        Ok(Self {
            entries,
            required_key: required_key.to_string(),
        })
    }

    /// Look up the value of a single entry.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Render the jar as a cookie header.
    ///
    /// The required entry comes first; every key appears once.
    pub fn to_header(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.entries.len());
        let mut seen: Vec<&str> = Vec::with_capacity(self.entries.len());

        if let Some(required) = self.value(&self.required_key) {
            parts.push(format!("{}={}", self.required_key, required));
            seen.push(&self.required_key);
        }

        for entry in &self.entries {
            if seen.contains(&entry.key.as_str()) {
                continue;
            }
            seen.push(&entry.key);
            parts.push(format!("{}={}", entry.key, entry.value));
        }

        parts.join("; ")
    }

    /// Number of entries in the blob.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the blob holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
