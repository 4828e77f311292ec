//! Credential acquisition against the identity provider.
//!
//! This module exchanges a username/password credential grant for a
//! bearer token and produces the [`AzureCredentials`] that scope the
//! management clients to one subscription. The exchange is never
//! retried: the credentials are either valid or they are not.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::{AuthError, ConfigError, PublishError, Result};

/// Resource scope tokens are requested for.
const MANAGEMENT_RESOURCE: &str = "https://management.core.windows.net/";

/// Token endpoint path below the authority URL.
const TOKEN_ENDPOINT: &str = "oauth2/token";

/// Request timeout for the token exchange.
const TOKEN_TIMEOUT_SECS: u64 = 30;

/// Bearer token and subscription scope for one authenticated session.
///
/// Owned exclusively by the publish run that created it; never persisted.
#[derive(Clone)]
pub struct AzureCredentials {
    /// Subscription the management clients are scoped to.
    pub subscription_id: String,
    token: String,
}

impl AzureCredentials {
    /// Creates credentials from a raw token and subscription id.
    #[must_use]
    pub fn new(subscription_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            token: token.into(),
        }
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("subscription_id", &self.subscription_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Token response from the identity provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error response from the identity provider.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges a credential grant for management API credentials.
#[derive(Debug)]
pub struct TokenAcquirer {
    /// HTTP client.
    client: Client,
    /// Identity provider authority URL.
    authority_url: String,
}

impl TokenAcquirer {
    /// Creates a token acquirer for the given authority.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(authority_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TOKEN_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                PublishError::Auth(AuthError::Network {
                    message: format!("Failed to create HTTP client: {e}"),
                })
            })?;

        Ok(Self {
            client,
            authority_url: authority_url.trim_end_matches('/').to_string(),
        })
    }

    /// Acquires management credentials for the configured account.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required field is absent (callers
    /// are expected to have validated already), or an [`AuthError`] if
    /// the identity provider rejects the grant.
    pub async fn acquire(&self, auth: &AuthConfig) -> Result<AzureCredentials> {
        let username = required_field(auth.username.as_deref(), "auth.username")?;
        let password = required_field(auth.password.as_deref(), "auth.password")?;

        debug!("Requesting token from {}", self.authority_url);

        let params = [
            ("grant_type", "password"),
            ("resource", MANAGEMENT_RESOURCE),
            ("client_id", auth.client_id.as_str()),
            ("username", username),
            ("password", password),
        ];

        let response = self
            .client
            .post(format!("{}/{TOKEN_ENDPOINT}", self.authority_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                PublishError::Auth(AuthError::Network {
                    message: format!("Token request failed: {e}"),
                })
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| format!("HTTP {status}"));

            return Err(PublishError::Auth(AuthError::Rejected { message }));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            PublishError::Auth(AuthError::InvalidResponse {
                message: format!("Failed to parse token response: {e}"),
            })
        })?;

        info!("Token acquired for subscription {}", auth.subscription_id);

        Ok(AzureCredentials::new(
            auth.subscription_id.clone(),
            token.access_token,
        ))
    }
}

/// Extracts a required optional field or fails with a configuration error.
fn required_field<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PublishError::Config(ConfigError::validation(
            format!("{field} is required"),
            field,
        ))),
    }
}
