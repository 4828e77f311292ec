//! The publishing pipeline.
//!
//! `publish` drives the stages strictly in sequence: configuration
//! validation, credential acquisition, existence check (which triggers
//! provisioning only when needed), publish-credential retrieval, and
//! content transfer. Each stage's success gates the next; the first
//! failure aborts the run and reaches the caller unchanged.

use std::time::Duration;
use tracing::{debug, info};

use crate::azure::{
    ArmClient, ManagementApi, PublishEndpoint, PublishProfile, SiteProvisioner, TokenAcquirer,
    FTP_PUBLISH_METHOD,
};
use crate::config::{ConfigValidator, PublishConfig};
use crate::error::{AzureError, PublishError, Result};
use crate::transfer::{
    ContentUploader, DirectoryWalker, FtpsConnector, SiteTree, TransferConnector,
};

/// Result of a publish run.
#[derive(Debug, serde::Serialize)]
pub struct PublishOutcome {
    /// The published site.
    pub app_name: String,
    /// Whether this run provisioned the hosting infrastructure.
    pub provisioned: bool,
    /// Remote directories created during the transfer.
    pub directories_created: usize,
    /// Files uploaded during the transfer.
    pub files_uploaded: usize,
}

impl std::fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Published '{}':", self.app_name)?;
        writeln!(
            f,
            "  Infrastructure: {}",
            if self.provisioned {
                "provisioned"
            } else {
                "already present"
            }
        )?;
        writeln!(f, "  Directories created: {}", self.directories_created)?;
        write!(f, "  Files uploaded: {}", self.files_uploaded)
    }
}

/// Orchestrates one publish run over the management and transfer seams.
///
/// All run state (deployment name, collected site tree, session handle)
/// is owned by the call, so concurrent runs with separate publishers are
/// safe.
pub struct Publisher<'a, A: ManagementApi, C: TransferConnector> {
    /// Configuration for this run.
    config: &'a PublishConfig,
    /// Management API handle.
    api: &'a A,
    /// Transfer session factory.
    connector: &'a C,
    /// Interval between deployment status checks.
    poll_interval: Duration,
    /// Maximum number of deployment status checks.
    max_poll_attempts: u32,
}

impl<'a, A: ManagementApi, C: TransferConnector> Publisher<'a, A, C> {
    /// Creates a publisher over the given seams.
    #[must_use]
    pub const fn new(config: &'a PublishConfig, api: &'a A, connector: &'a C) -> Self {
        Self {
            config,
            api,
            connector,
            poll_interval: crate::azure::DEFAULT_POLL_INTERVAL,
            max_poll_attempts: crate::azure::DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }

    /// Sets the interval between deployment status checks.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum number of deployment status checks.
    #[must_use]
    pub const fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Runs the publish pipeline.
    ///
    /// # Errors
    ///
    /// Fails fast with a configuration error before any remote call when
    /// required fields are missing; otherwise returns the first stage
    /// failure unchanged.
    pub async fn publish(&self) -> Result<PublishOutcome> {
        ConfigValidator::new().validate(self.config)?;

        let site = &self.config.site;
        // Generated once so the deployment submitted is the one polled.
        let deployment_name = site.effective_deployment_name();

        let provisioner = SiteProvisioner::new(self.api)
            .with_poll_interval(self.poll_interval)
            .with_max_poll_attempts(self.max_poll_attempts);

        let outcome = provisioner.ensure_site(site, &deployment_name).await?;

        let endpoint = self.fetch_publish_endpoint().await?;

        let tree = self.upload_content(&endpoint).await?;

        info!("Site '{}' published", site.app_name);

        Ok(PublishOutcome {
            app_name: site.app_name.clone(),
            provisioned: outcome.is_provisioned(),
            directories_created: tree.directories.len(),
            files_uploaded: tree.files.len(),
        })
    }

    /// Deletes the given resource group.
    ///
    /// Invoked explicitly for rollback; never run automatically on a
    /// failed publish.
    ///
    /// # Errors
    ///
    /// Surfaces the remote error unchanged.
    pub async fn cleanup(&self, resource_group: &str) -> Result<()> {
        info!("Deleting resource group '{resource_group}'");
        self.api.delete_resource_group(resource_group).await?;
        info!("Resource group '{resource_group}' purged");
        Ok(())
    }

    /// Retrieves the FTP publish profile and resolves the transfer
    /// endpoint, applying configured credential fallbacks.
    async fn fetch_publish_endpoint(&self) -> Result<PublishEndpoint> {
        let site = &self.config.site;
        let web_space = site.web_space_name();

        debug!("Fetching publish profiles for site '{}'", site.app_name);

        let profiles = self
            .api
            .list_publish_profiles(&web_space, &site.app_name)
            .await?;

        let profile = PublishProfile::select_transfer(&profiles).ok_or_else(|| {
            PublishError::Azure(AzureError::MissingPublishProfile {
                site: site.app_name.clone(),
                method: FTP_PUBLISH_METHOD.to_string(),
            })
        })?;

        let mut endpoint = profile.endpoint()?;

        // Profile credentials win; the configured values are fallbacks.
        if endpoint.username.is_none() {
            endpoint.username = self.config.transfer.username.clone();
        }
        if endpoint.password.is_none() {
            endpoint.password = self.config.transfer.password.clone();
        }

        debug!("FTP publish profile retrieved for '{}'", endpoint.host);

        Ok(endpoint)
    }

    /// Opens the transfer session, walks the site root, and mirrors the
    /// tree. The session is closed on every path before the result is
    /// reported.
    async fn upload_content(&self, endpoint: &PublishEndpoint) -> Result<SiteTree> {
        let site = &self.config.site;

        info!("Uploading site content from '{}'", site.directory.display());

        let session = self.connector.connect(endpoint).await?;

        let mirror_result = async {
            let tree = DirectoryWalker::new().walk(&site.directory).await?;
            ContentUploader::new(session.as_ref(), &site.directory)
                .mirror(&tree)
                .await?;
            Ok::<SiteTree, PublishError>(tree)
        }
        .await;

        let close_result = session.close().await;

        let tree = mirror_result?;
        close_result?;

        debug!("Transfer session closed");

        Ok(tree)
    }
}

/// Runs a full publish with the production management and transfer
/// implementations.
///
/// # Errors
///
/// Fails fast with a configuration error before any network call;
/// otherwise returns the first stage failure unchanged.
pub async fn publish(config: &PublishConfig) -> Result<PublishOutcome> {
    // Validation precedes credential acquisition, the first remote call.
    ConfigValidator::new().validate(config)?;

    let acquirer = TokenAcquirer::new(&config.auth.authority_url)?;
    let credentials = acquirer.acquire(&config.auth).await?;
    let client = ArmClient::new(credentials)?;
    let connector = FtpsConnector::new();

    Publisher::new(config, &client, &connector).publish().await
}

/// Deletes the named resource group with the production management
/// implementation.
///
/// # Errors
///
/// Fails fast with a configuration error before any network call;
/// otherwise surfaces the remote error unchanged.
pub async fn cleanup(config: &PublishConfig, resource_group: &str) -> Result<()> {
    ConfigValidator::new().validate(config)?;

    let acquirer = TokenAcquirer::new(&config.auth.authority_url)?;
    let credentials = acquirer.acquire(&config.auth).await?;
    let client = ArmClient::new(credentials)?;
    let connector = FtpsConnector::new();

    Publisher::new(config, &client, &connector)
        .cleanup(resource_group)
        .await
}
