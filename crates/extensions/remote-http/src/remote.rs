//! reqwest-backed remote service adapter.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::COOKIE;
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use cadence_protocols::{ContentResolver, Publisher, RemoteError};

/// Pattern the token page embeds its bearer token with.
const TOKEN_PATTERN: &str = r#""accessToken":\s*"([^"]+)""#;

/// Errors raised while building the adapter.
#[derive(Debug, Error)]
pub enum HttpRemoteError {
    #[error("Invalid endpoint {name}: {message}")]
    InvalidEndpoint { name: &'static str, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Endpoints and client settings.
#[derive(Debug, Clone)]
pub struct HttpRemoteSettings {
    pub resolve_url: String,
    pub token_url: String,
    pub publish_url: String,
    pub link_base: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Remote service adapter.
pub struct HttpRemote {
    client: Client,
    resolve_url: Url,
    token_url: Url,
    publish_url: Url,
    link_base: String,
    token_pattern: Regex,
}

impl HttpRemote {
    /// Create a new adapter, validating every endpoint up front.
    pub fn new(settings: HttpRemoteSettings) -> Result<Self, HttpRemoteError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            resolve_url: parse_endpoint("resolve_url", &settings.resolve_url)?,
            token_url: parse_endpoint("token_url", &settings.token_url)?,
            publish_url: parse_endpoint("publish_url", &settings.publish_url)?,
            link_base: settings.link_base,
            token_pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    fn extract_token(&self, body: &str) -> Option<String> {
        self.token_pattern
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|token| !token.is_empty())
    }
}

fn parse_endpoint(name: &'static str, raw: &str) -> Result<Url, HttpRemoteError> {
    Url::parse(raw).map_err(|e| HttpRemoteError::InvalidEndpoint {
        name,
        message: e.to_string(),
    })
}

/// The resolver answers `{"id": ...}` with either a string or a number.
fn content_id_from(body: &serde_json::Value) -> Option<String> {
    match body.get("id")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ContentResolver for HttpRemote {
    async fn resolve_content_id(&self, url: &str) -> Option<String> {
        let response = match self
            .client
            .post(self.resolve_url.clone())
            .form(&[("link", url)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(target_url = %url, "Content id lookup failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(target_url = %url, status = status.as_u16(), "Content id lookup rejected");
            return None;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => {
                let id = content_id_from(&body);
                if id.is_none() {
                    warn!(target_url = %url, "Resolver returned no content id");
                }
                id
            }
            Err(e) => {
                error!(target_url = %url, "Malformed resolver response: {}", e);
                None
            }
        }
    }

    async fn derive_access_token(&self, credential: &str) -> Option<String> {
        let response = match self
            .client
            .get(self.token_url.clone())
            .header(COOKIE, credential)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Access token request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Access token page rejected credential");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                let token = self.extract_token(&body);
                if token.is_none() {
                    debug!("No access token found in token page");
                }
                token
            }
            Err(e) => {
                error!("Failed to read access token page: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Publisher for HttpRemote {
    async fn publish(
        &self,
        resolved_id: &str,
        token: &str,
        credential: &str,
    ) -> Result<(), RemoteError> {
        let link = format!("{}{}", self.link_base, resolved_id);

        let response = self
            .client
            .post(self.publish_url.clone())
            .query(&[
                ("link", link.as_str()),
                ("published", "0"),
                ("access_token", token),
            ])
            .header(COOKIE, credential)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        debug!(resolved_id, "Remote write accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
