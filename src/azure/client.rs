//! Azure management API client implementation.
//!
//! This module provides the HTTP client for the resource management and
//! web hosting management surfaces, implementing [`ManagementApi`] over
//! the REST endpoints. One client serves both capability sets; calls are
//! addressed by the subscription the client is scoped to.

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{AzureError, PublishError, Result};

use super::api::ManagementApi;
use super::auth::AzureCredentials;
use super::types::{Deployment, DeploymentRequest, PublishProfile, WebSite, WebSpace};

/// Management API base URL.
const MANAGEMENT_API_URL: &str = "https://management.azure.com";

/// API version for resource management operations.
const RESOURCE_API_VERSION: &str = "2021-04-01";

/// API version for web hosting operations.
const WEB_API_VERSION: &str = "2023-12-01";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error codes the management API uses for plain absence.
///
/// The match is kept strict: a 404 carrying any other code (an auth
/// proxy rewriting an expired-token response, for example) must stay a
/// fatal [`AzureError::RequestFailed`].
const NOT_FOUND_CODES: &[&str] = &["NotFound", "ResourceNotFound", "ResourceGroupNotFound"];

/// Azure management API client.
#[derive(Debug, Clone)]
pub struct ArmClient {
    /// HTTP client.
    client: Client,
    /// Base URL (overridable for tests).
    base_url: String,
    /// Token-bound credentials.
    credentials: AzureCredentials,
}

/// Error envelope returned by the management API.
#[derive(Debug, Deserialize)]
struct ArmErrorEnvelope {
    #[serde(default)]
    error: Option<ArmErrorBody>,
    // Some endpoints flatten the error body to the top level.
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Error body within the envelope.
#[derive(Debug, Deserialize)]
struct ArmErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ArmErrorEnvelope {
    fn code(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .or(self.code.as_deref())
    }

    fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .or(self.message.as_deref())
    }
}

/// Envelope wrapping a publish profile listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishProfilesEnvelope {
    #[serde(default)]
    publish_profiles: Vec<PublishProfile>,
}

impl ArmClient {
    /// Creates a new management API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(credentials: AzureCredentials) -> Result<Self> {
        Self::with_base_url(credentials, MANAGEMENT_API_URL)
    }

    /// Creates a client against a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_base_url(credentials: AzureCredentials, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AzureError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Builds a resource-management URL below the subscription.
    fn resource_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}/{path}?api-version={RESOURCE_API_VERSION}",
            self.base_url, self.credentials.subscription_id
        )
    }

    /// Builds a web-hosting URL below the subscription.
    fn web_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.Web/{path}?api-version={WEB_API_VERSION}",
            self.base_url, self.credentials.subscription_id
        )
    }

    /// Sends a request with the bearer token attached.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        request
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.credentials.token()),
            )
            .send()
            .await
            .map_err(|e| {
                PublishError::Azure(AzureError::Network {
                    message: format!("Request failed: {e}"),
                })
            })
    }

    /// Maps a non-success response to an error, distinguishing strict
    /// not-found signals from everything else.
    async fn error_from(response: Response, resource: &str, name: &str) -> PublishError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let envelope: Option<ArmErrorEnvelope> = serde_json::from_str(&body).ok();
        let code = envelope.as_ref().and_then(ArmErrorEnvelope::code);

        if status == StatusCode::NOT_FOUND
            && code.is_some_and(|c| NOT_FOUND_CODES.contains(&c))
        {
            return PublishError::Azure(AzureError::not_found(resource, name));
        }

        let message = envelope
            .as_ref()
            .and_then(ArmErrorEnvelope::message)
            .map_or_else(|| body.clone(), ToString::to_string);

        PublishError::Azure(AzureError::request(status.as_u16(), message))
    }

    /// Fetches and deserializes a JSON resource.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        resource: &str,
        name: &str,
    ) -> Result<T> {
        trace!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, resource, name).await);
        }

        response.json().await.map_err(|e| {
            PublishError::Azure(AzureError::InvalidResponse {
                message: format!("Failed to parse response: {e}"),
            })
        })
    }
}

#[async_trait]
impl ManagementApi for ArmClient {
    async fn resource_group_exists(&self, name: &str) -> Result<bool> {
        let url = self.resource_url(&format!("resourcegroups/{name}"));
        debug!("Checking existence of resource group '{name}'");

        let response = self.send(self.client.head(&url)).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_from(response, "resource group", name).await),
        }
    }

    async fn create_resource_group(&self, name: &str, region: &str) -> Result<()> {
        let url = self.resource_url(&format!("resourcegroups/{name}"));
        debug!("Creating resource group '{name}' in '{region}'");

        let body = serde_json::json!({ "location": region });
        let response = self.send(self.client.put(&url).json(&body)).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "resource group", name).await);
        }

        Ok(())
    }

    async fn create_deployment(
        &self,
        resource_group: &str,
        name: &str,
        request: &DeploymentRequest,
    ) -> Result<()> {
        let url = self.resource_url(&format!(
            "resourcegroups/{resource_group}/providers/Microsoft.Resources/deployments/{name}"
        ));
        debug!("Submitting template deployment '{name}' to '{resource_group}'");

        let response = self.send(self.client.put(&url).json(request)).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "deployment", name).await);
        }

        Ok(())
    }

    async fn get_deployment(&self, resource_group: &str, name: &str) -> Result<Deployment> {
        let url = self.resource_url(&format!(
            "resourcegroups/{resource_group}/providers/Microsoft.Resources/deployments/{name}"
        ));

        self.get_json(url, "deployment", name).await
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        let url = self.resource_url(&format!("resourcegroups/{name}"));
        debug!("Deleting resource group '{name}'");

        let response = self.send(self.client.delete(&url)).await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "resource group", name).await);
        }

        Ok(())
    }

    async fn get_web_space(&self, name: &str) -> Result<WebSpace> {
        let url = self.web_url(&format!("webSpaces/{name}"));
        debug!("Fetching web space '{name}'");

        self.get_json(url, "web space", name).await
    }

    async fn get_web_site(&self, web_space: &str, name: &str) -> Result<WebSite> {
        let url = self.web_url(&format!("webSpaces/{web_space}/sites/{name}"));
        debug!("Fetching site '{name}' in web space '{web_space}'");

        self.get_json(url, "site", name).await
    }

    async fn list_publish_profiles(
        &self,
        web_space: &str,
        site: &str,
    ) -> Result<Vec<PublishProfile>> {
        let url = self.web_url(&format!(
            "webSpaces/{web_space}/sites/{site}/publishProfiles"
        ));
        debug!("Fetching publish profiles for site '{site}'");

        let envelope: PublishProfilesEnvelope = self.get_json(url, "site", site).await?;
        Ok(envelope.publish_profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::types::ProvisioningState;
    use wiremock::matchers::{body_json_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> ArmClient {
        let credentials = AzureCredentials::new("sub-id", "tok-123");
        ArmClient::with_base_url(credentials, &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn existence_check_maps_head_responses() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/subscriptions/sub-id/resourcegroups/present-rg"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        Mock::given(method("HEAD"))
            .and(path("/subscriptions/sub-id/resourcegroups/absent-rg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server).await;
        assert!(client.resource_group_exists("present-rg").await.unwrap());
        assert!(!client.resource_group_exists("absent-rg").await.unwrap());
    }

    #[tokio::test]
    async fn strict_not_found_code_becomes_resource_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/sub-id/providers/Microsoft.Web/webSpaces/demo-space",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "code": "NotFound", "message": "Web space not found." }
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = client.get_web_space("demo-space").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unrecognized_404_code_stays_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/sub-id/providers/Microsoft.Web/webSpaces/demo-space",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "code": "ExpiredAuthenticationToken", "message": "Token expired." }
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = client.get_web_space("demo-space").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            PublishError::Azure(AzureError::RequestFailed { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn create_resource_group_puts_location_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub-id/resourcegroups/demo-rg"))
            .and(body_json_string(r#"{"location":"East US"}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        client
            .create_resource_group("demo-rg", "East US")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deployment_status_round_trips() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/sub-id/resourcegroups/demo-rg/providers/Microsoft.Resources/deployments/demo-deploy",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "demo-deploy",
                "properties": {
                    "provisioningState": "Running",
                    "timestamp": "2026-01-15T10:30:00Z"
                }
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let deployment = client.get_deployment("demo-rg", "demo-deploy").await.unwrap();
        assert_eq!(
            deployment.properties.provisioning_state,
            ProvisioningState::Running
        );
    }

    #[tokio::test]
    async fn publish_profiles_unwrap_their_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/sub-id/providers/Microsoft.Web/webSpaces/demo-space/sites/demo-site/publishProfiles",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "publishProfiles": [
                    {
                        "profileName": "demo-site - FTP",
                        "publishMethod": "FTP",
                        "publishUrl": "ftp://waws-prod.ftp.example.net/site/wwwroot",
                        "userName": "demo-site\\$demo-site",
                        "userPassword": "pw"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let profiles = client
            .list_publish_profiles("demo-space", "demo-site")
            .await
            .unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].publish_method, "FTP");
    }
}
