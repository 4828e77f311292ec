//! Azure management API types and data structures.
//!
//! This module defines the payload types exchanged with the resource
//! management and web hosting management APIs, plus the publish profile
//! selection logic that feeds the transfer stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TransferError;

/// Publish method used for content transfer.
pub const FTP_PUBLISH_METHOD: &str = "FTP";

/// Default FTP control port when the publish URL does not carry one.
const DEFAULT_FTP_PORT: u16 = 21;

/// A resource group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Fully qualified resource id.
    #[serde(default)]
    pub id: Option<String>,
    /// Resource group name.
    pub name: String,
    /// Region the group is pinned to.
    pub location: String,
}

/// A template deployment as reported by the management API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Deployment name.
    #[serde(default)]
    pub name: Option<String>,
    /// Deployment status properties.
    pub properties: DeploymentStatus,
}

/// Status properties of a template deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    /// Lifecycle state tracked by the management system.
    #[serde(default)]
    pub provisioning_state: ProvisioningState,
    /// When the state was last updated.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Correlation id for support requests.
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// Deployment provisioning state.
///
/// The deployment transitions externally; this crate only observes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProvisioningState {
    /// Deployment accepted but not started.
    Accepted,
    /// Deployment in progress.
    Running,
    /// Terminal success.
    Succeeded,
    /// Terminal failure.
    Failed,
    /// Any state this crate does not model.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProvisioningState {
    /// Returns true once the deployment can no longer make progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            Self::Accepted => "Accepted",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        };
        write!(f, "{state}")
    }
}

/// Request body for a template deployment.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentRequest {
    /// Deployment properties.
    pub properties: DeploymentRequestProperties,
}

/// Properties of a template deployment request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequestProperties {
    /// The parsed ARM template.
    pub template: serde_json::Value,
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// Bound template parameters.
    pub parameters: DeploymentParameters,
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Additive: resources outside the template are preserved.
    Incremental,
    /// Destructive: resources outside the template are removed.
    Complete,
}

/// The three parameters bound into every site template deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentParameters {
    /// Web App name.
    pub site_name: ParameterValue,
    /// Hosting plan name.
    pub hosting_plan_name: ParameterValue,
    /// Target region.
    pub site_location: ParameterValue,
}

/// A single bound parameter value.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterValue {
    /// The parameter value.
    pub value: String,
}

impl DeploymentRequest {
    /// Builds an incremental deployment request with the three bound
    /// site parameters.
    #[must_use]
    pub fn incremental(
        template: serde_json::Value,
        site_name: &str,
        hosting_plan_name: &str,
        site_location: &str,
    ) -> Self {
        Self {
            properties: DeploymentRequestProperties {
                template,
                mode: DeploymentMode::Incremental,
                parameters: DeploymentParameters {
                    site_name: ParameterValue {
                        value: site_name.to_string(),
                    },
                    hosting_plan_name: ParameterValue {
                        value: hosting_plan_name.to_string(),
                    },
                    site_location: ParameterValue {
                        value: site_location.to_string(),
                    },
                },
            },
        }
    }
}

/// A web space (the hosting namespace sites are registered under).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSpace {
    /// Web space name.
    pub name: String,
    /// Region the web space is served from.
    #[serde(default)]
    pub geo_region: Option<String>,
    /// Hosting plan backing the web space.
    #[serde(default)]
    pub plan: Option<String>,
}

/// A web site registered within a web space.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSite {
    /// Site name.
    pub name: String,
    /// Running state as reported by the platform.
    #[serde(default)]
    pub state: Option<String>,
    /// Hostnames bound to the site.
    #[serde(default)]
    pub host_names: Vec<String>,
}

/// A publish profile issued by the hosting platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishProfile {
    /// Profile display name.
    #[serde(default)]
    pub profile_name: Option<String>,
    /// Transfer protocol this profile serves (e.g. "FTP").
    pub publish_method: String,
    /// Endpoint URL for the transfer protocol.
    pub publish_url: String,
    /// Deployment username.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Deployment password.
    #[serde(default)]
    pub user_password: Option<String>,
}

/// Endpoint and credentials for the content transfer stage.
///
/// Fetched fresh each run and held only in memory for the duration of
/// the transfer.
#[derive(Clone)]
pub struct PublishEndpoint {
    /// Transfer host.
    pub host: String,
    /// Transfer control port.
    pub port: u16,
    /// Deployment username, if the profile carried one.
    pub username: Option<String>,
    /// Deployment password, if the profile carried one.
    pub password: Option<String>,
}

impl std::fmt::Debug for PublishEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PublishProfile {
    /// Selects the FTP profile from a fetched profile set.
    #[must_use]
    pub fn select_transfer(profiles: &[Self]) -> Option<&Self> {
        profiles
            .iter()
            .find(|profile| profile.publish_method == FTP_PUBLISH_METHOD)
    }

    /// Parses this profile's endpoint URL into a transfer endpoint.
    ///
    /// Profiles sometimes omit the URL scheme; a bare `host/path` form is
    /// parsed as if it were `ftp://host/path`.
    ///
    /// # Errors
    ///
    /// Returns an error if no host can be extracted from the URL.
    pub fn endpoint(&self) -> Result<PublishEndpoint, TransferError> {
        let parsed = Url::parse(&self.publish_url)
            .or_else(|_| Url::parse(&format!("ftp://{}", self.publish_url)))
            .map_err(|e| TransferError::InvalidEndpoint {
                url: self.publish_url.clone(),
                message: e.to_string(),
            })?;

        let host = parsed
            .host_str()
            .ok_or_else(|| TransferError::InvalidEndpoint {
                url: self.publish_url.clone(),
                message: String::from("no host in publish URL"),
            })?;

        Ok(PublishEndpoint {
            host: host.to_string(),
            port: parsed.port().unwrap_or(DEFAULT_FTP_PORT),
            username: self.user_name.clone(),
            password: self.user_password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(method: &str, url: &str) -> PublishProfile {
        PublishProfile {
            profile_name: None,
            publish_method: method.to_string(),
            publish_url: url.to_string(),
            user_name: Some(String::from("site\\deployer")),
            user_password: Some(String::from("secret")),
        }
    }

    #[test]
    fn selects_ftp_profile_among_others() {
        let profiles = vec![
            profile("MSDeploy", "https://site.scm.azurewebsites.net/msdeploy.axd"),
            profile("FTP", "ftp://waws-prod-blu-001.ftp.azurewebsites.windows.net/site/wwwroot"),
        ];

        let selected = PublishProfile::select_transfer(&profiles).unwrap();
        assert_eq!(selected.publish_method, "FTP");
    }

    #[test]
    fn no_ftp_profile_yields_none() {
        let profiles = vec![profile("MSDeploy", "https://example.com/msdeploy.axd")];
        assert!(PublishProfile::select_transfer(&profiles).is_none());
    }

    #[test]
    fn endpoint_extracts_host_from_url() {
        let endpoint = profile(
            "FTP",
            "ftp://waws-prod-blu-001.ftp.azurewebsites.windows.net/site/wwwroot",
        )
        .endpoint()
        .unwrap();

        assert_eq!(endpoint.host, "waws-prod-blu-001.ftp.azurewebsites.windows.net");
        assert_eq!(endpoint.port, 21);
        assert_eq!(endpoint.username.as_deref(), Some("site\\deployer"));
    }

    #[test]
    fn endpoint_tolerates_missing_scheme() {
        let endpoint = profile("FTP", "waws-prod-blu-001.ftp.azurewebsites.windows.net/site")
            .endpoint()
            .unwrap();

        assert_eq!(endpoint.host, "waws-prod-blu-001.ftp.azurewebsites.windows.net");
    }

    #[test]
    fn endpoint_honors_explicit_port() {
        let endpoint = profile("FTP", "ftp://transfer.example.net:990/site")
            .endpoint()
            .unwrap();
        assert_eq!(endpoint.port, 990);
    }

    #[test]
    fn provisioning_state_terminality() {
        assert!(ProvisioningState::Succeeded.is_terminal());
        assert!(ProvisioningState::Failed.is_terminal());
        assert!(!ProvisioningState::Running.is_terminal());
        assert!(!ProvisioningState::Accepted.is_terminal());
        assert!(!ProvisioningState::Unknown.is_terminal());
    }

    #[test]
    fn unknown_provisioning_state_deserializes() {
        let deployment: Deployment = serde_json::from_str(
            r#"{"name":"d1","properties":{"provisioningState":"Canceling"}}"#,
        )
        .unwrap();
        assert_eq!(
            deployment.properties.provisioning_state,
            ProvisioningState::Unknown
        );
    }

    #[test]
    fn deployment_request_binds_camel_case_parameters() {
        let request = DeploymentRequest::incremental(
            serde_json::json!({"resources": []}),
            "demo-site",
            "demo-plan",
            "East US",
        );

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["properties"]["mode"], "Incremental");
        assert_eq!(
            body["properties"]["parameters"]["siteName"]["value"],
            "demo-site"
        );
        assert_eq!(
            body["properties"]["parameters"]["hostingPlanName"]["value"],
            "demo-plan"
        );
        assert_eq!(
            body["properties"]["parameters"]["siteLocation"]["value"],
            "East US"
        );
    }
}
