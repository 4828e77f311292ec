//! Azure management integration module.
//!
//! This module provides credential acquisition, the management API
//! client, and the provisioning engine that ensures a site's hosting
//! infrastructure exists before content is published.

mod api;
mod auth;
mod client;
mod provisioner;
mod types;

pub use api::ManagementApi;
pub use auth::{AzureCredentials, TokenAcquirer};
pub use client::ArmClient;
pub use provisioner::{
    EnsureOutcome, SiteProvisioner, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};
pub use types::{
    Deployment, DeploymentMode, DeploymentParameters, DeploymentRequest,
    DeploymentRequestProperties, DeploymentStatus, ParameterValue, ProvisioningState,
    PublishEndpoint, PublishProfile, ResourceGroup, WebSite, WebSpace, FTP_PUBLISH_METHOD,
};
