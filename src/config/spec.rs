//! Configuration specification types for the publishing pipeline.
//!
//! This module defines the structs that map to the `sitewright.publish.yaml`
//! file. One [`PublishConfig`] fully describes a publish run and is
//! immutable for its duration; each run reconstructs it fresh.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// The root configuration structure for a publish run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishConfig {
    /// Azure credential configuration.
    pub auth: AuthConfig,
    /// Target site configuration.
    pub site: SiteConfig,
    /// Optional transfer credential fallbacks.
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// Azure credential configuration.
///
/// `username` and `password` are normally left out of the YAML file and
/// supplied through `SITEWRIGHT_AZURE_USERNAME` / `SITEWRIGHT_AZURE_PASSWORD`
/// (or a `.env` file next to the config).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    /// Identity provider authority URL (tenant-scoped).
    pub authority_url: String,
    /// Application (client) id used for the credential grant.
    pub client_id: String,
    /// Subscription the management clients are scoped to.
    pub subscription_id: String,
    /// Account username.
    #[serde(default)]
    pub username: Option<String>,
    /// Account password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Target site configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    /// Resource group that contains (or will contain) the site.
    pub resource_group: String,
    /// Azure region, e.g. "East US".
    pub region: String,
    /// Web App name.
    pub app_name: String,
    /// App Service hosting plan name.
    pub hosting_plan: String,
    /// Local directory holding the built site content.
    pub directory: PathBuf,
    /// Path to the ARM deployment template (UTF-8 JSON).
    pub template_path: PathBuf,
    /// Template deployment name. Generated per run when unset.
    #[serde(default)]
    pub deployment_name: Option<String>,
}

/// Optional transfer credential fallbacks.
///
/// When the fetched publish profile carries no credentials these are used
/// instead; they are normally sourced from `SITEWRIGHT_DEPLOYMENT_USER` /
/// `SITEWRIGHT_DEPLOYMENT_PASSWORD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferConfig {
    /// Deployment username fallback.
    #[serde(default)]
    pub username: Option<String>,
    /// Deployment password fallback.
    #[serde(default)]
    pub password: Option<String>,
}

impl SiteConfig {
    /// Derives the web-space name the site lives under.
    ///
    /// The hosting platform scopes sites to a web space named after the
    /// resource group and region, with spaces stripped from the region.
    #[must_use]
    pub fn web_space_name(&self) -> String {
        format!(
            "{}-{}webspace",
            self.resource_group,
            self.region.replace(' ', "")
        )
    }

    /// Returns the configured deployment name, or generates one.
    ///
    /// Callers hold the result for the duration of a run so that the
    /// deployment that was submitted is the one that gets polled.
    #[must_use]
    pub fn effective_deployment_name(&self) -> String {
        self.deployment_name.clone().unwrap_or_else(|| {
            format!("{}-deploy-{}", self.app_name, Uuid::new_v4())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            resource_group: String::from("demo-rg"),
            region: String::from("East US"),
            app_name: String::from("demo-site"),
            hosting_plan: String::from("demo-plan"),
            directory: PathBuf::from("_site"),
            template_path: PathBuf::from("arm/site.json"),
            deployment_name: None,
        }
    }

    #[test]
    fn web_space_name_strips_region_spaces() {
        assert_eq!(site().web_space_name(), "demo-rg-EastUSwebspace");
    }

    #[test]
    fn deployment_name_prefers_configured_value() {
        let mut config = site();
        config.deployment_name = Some(String::from("pinned-deploy"));
        assert_eq!(config.effective_deployment_name(), "pinned-deploy");
    }

    #[test]
    fn deployment_name_default_is_app_scoped() {
        let name = site().effective_deployment_name();
        assert!(name.starts_with("demo-site-deploy-"));
    }
}
