//! Management API trait definition.
//!
//! This narrow seam covers the full capability set the pipeline needs
//! from the resource management and web hosting management APIs; the
//! production implementation is [`super::ArmClient`], and tests swap in
//! recording fakes.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{Deployment, DeploymentRequest, PublishProfile, WebSite, WebSpace};

/// Capability set of the Azure management surface.
///
/// Every call is request/response, addressed by the subscription the
/// implementation is scoped to plus the names passed in.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Checks whether a resource group exists.
    ///
    /// Implementations should report plain absence as `Ok(false)`, but
    /// callers making provisioning decisions must also tolerate absence
    /// surfacing as a not-found error (a known quirk of the legacy
    /// existence check).
    async fn resource_group_exists(&self, name: &str) -> Result<bool>;

    /// Creates (or updates) a resource group in the given region.
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<()>;

    /// Submits a template deployment to a resource group.
    async fn create_deployment(
        &self,
        resource_group: &str,
        name: &str,
        request: &DeploymentRequest,
    ) -> Result<()>;

    /// Fetches the current status of a template deployment.
    async fn get_deployment(&self, resource_group: &str, name: &str) -> Result<Deployment>;

    /// Deletes a resource group and everything in it.
    async fn delete_resource_group(&self, name: &str) -> Result<()>;

    /// Fetches a web space (hosting namespace) by name.
    async fn get_web_space(&self, name: &str) -> Result<WebSpace>;

    /// Fetches a site registered within a web space.
    async fn get_web_site(&self, web_space: &str, name: &str) -> Result<WebSite>;

    /// Fetches the publish profiles issued for a site.
    async fn list_publish_profiles(
        &self,
        web_space: &str,
        site: &str,
    ) -> Result<Vec<PublishProfile>>;
}
