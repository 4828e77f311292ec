//! Site provisioner: existence checks, template deployment, polling.
//!
//! This module decides whether the hosting infrastructure for a site
//! already exists and, when it does not, drives the template deployment
//! to a terminal state. Probing before provisioning avoids destructive
//! or redundant re-creation of live infrastructure.

use std::time::Duration;
use tracing::{debug, info};

use crate::config::SiteConfig;
use crate::error::{AzureError, ConfigError, PublishError, Result};

use super::api::ManagementApi;
use super::types::{Deployment, DeploymentRequest, ProvisioningState};

/// Default interval between deployment status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default upper bound on status checks (about twenty minutes at the
/// default interval) so a wedged deployment cannot block forever.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;

/// Outcome of an [`SiteProvisioner::ensure_site`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Web space and site were both already present.
    Existing,
    /// Infrastructure was provisioned by this run.
    Provisioned,
}

impl EnsureOutcome {
    /// Returns true if this run created the infrastructure.
    #[must_use]
    pub const fn is_provisioned(self) -> bool {
        matches!(self, Self::Provisioned)
    }
}

/// Provisioner for a site's hosting infrastructure.
#[derive(Debug)]
pub struct SiteProvisioner<'a, A: ManagementApi> {
    /// Management API handle.
    api: &'a A,
    /// Interval between deployment status checks.
    poll_interval: Duration,
    /// Maximum number of status checks before giving up.
    max_poll_attempts: u32,
}

impl<'a, A: ManagementApi> SiteProvisioner<'a, A> {
    /// Creates a provisioner with default polling behavior.
    #[must_use]
    pub const fn new(api: &'a A) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }

    /// Sets the interval between deployment status checks.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum number of status checks.
    #[must_use]
    pub const fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Ensures the web space and site exist, provisioning them if not.
    ///
    /// Probe order is web space first, then the site within it; a
    /// not-found signal from either probe triggers provisioning, and any
    /// other failure aborts the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error on any management failure other than the benign
    /// not-found signals, or if provisioning itself fails.
    pub async fn ensure_site(
        &self,
        site: &SiteConfig,
        deployment_name: &str,
    ) -> Result<EnsureOutcome> {
        let web_space = site.web_space_name();
        debug!(
            "Determining whether site '{}' already exists in web space '{web_space}'",
            site.app_name
        );

        match self.api.get_web_space(&web_space).await {
            Ok(_) => {
                debug!("Web space '{web_space}' already exists");

                match self.api.get_web_site(&web_space, &site.app_name).await {
                    Ok(_) => {
                        info!("Site '{}' already exists; skipping provisioning", site.app_name);
                        return Ok(EnsureOutcome::Existing);
                    }
                    Err(e) if e.is_not_found() => {
                        debug!("Site '{}' does not exist", site.app_name);
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) if e.is_not_found() => {
                debug!("Web space '{web_space}' does not exist");
            }
            Err(e) => return Err(e),
        }

        self.provision(site, deployment_name).await?;
        Ok(EnsureOutcome::Provisioned)
    }

    /// Provisions the resource group (when absent) and deploys the site
    /// template, waiting for the deployment to complete.
    async fn provision(&self, site: &SiteConfig, deployment_name: &str) -> Result<()> {
        let resource_group = &site.resource_group;

        let exists = match self.api.resource_group_exists(resource_group).await {
            Ok(exists) => exists,
            // The legacy existence check can report absence as an error;
            // only the strictly-validated not-found signal is downgraded.
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        if exists {
            debug!("Resource group '{resource_group}' exists; skipping creation");
        } else {
            info!("Creating resource group '{resource_group}' in '{}'", site.region);
            self.api
                .create_resource_group(resource_group, &site.region)
                .await?;
            info!("Resource group '{resource_group}' created");
        }

        let request = self.load_deployment_request(site).await?;

        info!("Deploying template to resource group '{resource_group}'");
        self.api
            .create_deployment(resource_group, deployment_name, &request)
            .await?;
        debug!("Template deployment '{deployment_name}' initiated");

        self.wait_for_deployment(resource_group, deployment_name)
            .await?;

        Ok(())
    }

    /// Reads and parses the local template, binding the site parameters.
    async fn load_deployment_request(&self, site: &SiteConfig) -> Result<DeploymentRequest> {
        let content = tokio::fs::read_to_string(&site.template_path)
            .await
            .map_err(|e| {
                PublishError::Config(ConfigError::InvalidTemplate {
                    path: site.template_path.clone(),
                    message: format!("Failed to read template: {e}"),
                })
            })?;

        let template: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            PublishError::Config(ConfigError::InvalidTemplate {
                path: site.template_path.clone(),
                message: format!("Template is not valid JSON: {e}"),
            })
        })?;

        Ok(DeploymentRequest::incremental(
            template,
            &site.app_name,
            &site.hosting_plan,
            &site.region,
        ))
    }

    /// Polls the deployment until it reaches a terminal state.
    ///
    /// Resolution is immediate once `Succeeded` or `Failed` is observed;
    /// no further status checks are issued afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::DeploymentFailed`] on the terminal `Failed`
    /// state, [`AzureError::DeploymentTimeout`] once the attempt bound is
    /// exhausted, or any transport error unchanged.
    pub async fn wait_for_deployment(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Deployment> {
        for attempt in 1..=self.max_poll_attempts {
            let deployment = self
                .api
                .get_deployment(resource_group, deployment_name)
                .await?;

            match deployment.properties.provisioning_state {
                ProvisioningState::Succeeded => {
                    info!("Template deployment '{deployment_name}' succeeded");
                    return Ok(deployment);
                }
                ProvisioningState::Failed => {
                    return Err(PublishError::Azure(AzureError::DeploymentFailed {
                        resource_group: resource_group.to_string(),
                        deployment: deployment_name.to_string(),
                    }));
                }
                state => {
                    debug!(
                        "Template deployment '{deployment_name}' is {state} \
                         (check {attempt}/{}); waiting",
                        self.max_poll_attempts
                    );
                }
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(PublishError::Azure(AzureError::DeploymentTimeout {
            deployment: deployment_name.to_string(),
            attempts: self.max_poll_attempts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::types::{DeploymentStatus, PublishProfile, WebSite, WebSpace};
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// How the mock existence check reports an absent resource group.
    #[derive(Clone, Copy)]
    enum RgExistence {
        Exists,
        Absent,
        AbsentAsError,
    }

    struct MockApi {
        web_space_found: bool,
        site_found: bool,
        rg_existence: RgExistence,
        deployment_states: Mutex<Vec<ProvisioningState>>,
        rg_checks: AtomicU32,
        rg_creates: AtomicU32,
        deployment_creates: AtomicU32,
        polls: AtomicU32,
    }

    impl MockApi {
        fn new(web_space_found: bool, site_found: bool, rg_existence: RgExistence) -> Self {
            Self {
                web_space_found,
                site_found,
                rg_existence,
                deployment_states: Mutex::new(vec![ProvisioningState::Succeeded]),
                rg_checks: AtomicU32::new(0),
                rg_creates: AtomicU32::new(0),
                deployment_creates: AtomicU32::new(0),
                polls: AtomicU32::new(0),
            }
        }

        fn with_states(self, states: Vec<ProvisioningState>) -> Self {
            *self.deployment_states.lock().unwrap() = states;
            self
        }
    }

    #[async_trait]
    impl ManagementApi for MockApi {
        async fn resource_group_exists(&self, name: &str) -> Result<bool> {
            self.rg_checks.fetch_add(1, Ordering::SeqCst);
            match self.rg_existence {
                RgExistence::Exists => Ok(true),
                RgExistence::Absent => Ok(false),
                RgExistence::AbsentAsError => {
                    Err(PublishError::Azure(AzureError::not_found("resource group", name)))
                }
            }
        }

        async fn create_resource_group(&self, _name: &str, _region: &str) -> Result<()> {
            self.rg_creates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create_deployment(
            &self,
            _resource_group: &str,
            _name: &str,
            _request: &DeploymentRequest,
        ) -> Result<()> {
            self.deployment_creates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_deployment(&self, _resource_group: &str, name: &str) -> Result<Deployment> {
            let index = self.polls.fetch_add(1, Ordering::SeqCst) as usize;
            let states = self.deployment_states.lock().unwrap();
            let state = states.get(index).copied().unwrap_or(
                *states.last().expect("mock has at least one state"),
            );

            Ok(Deployment {
                name: Some(name.to_string()),
                properties: DeploymentStatus {
                    provisioning_state: state,
                    timestamp: None,
                    correlation_id: None,
                },
            })
        }

        async fn delete_resource_group(&self, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn get_web_space(&self, name: &str) -> Result<WebSpace> {
            if self.web_space_found {
                Ok(WebSpace {
                    name: name.to_string(),
                    geo_region: None,
                    plan: None,
                })
            } else {
                Err(PublishError::Azure(AzureError::not_found("web space", name)))
            }
        }

        async fn get_web_site(&self, _web_space: &str, name: &str) -> Result<WebSite> {
            if self.site_found {
                Ok(WebSite {
                    name: name.to_string(),
                    state: None,
                    host_names: vec![],
                })
            } else {
                Err(PublishError::Azure(AzureError::not_found("site", name)))
            }
        }

        async fn list_publish_profiles(
            &self,
            _web_space: &str,
            _site: &str,
        ) -> Result<Vec<PublishProfile>> {
            Ok(vec![])
        }
    }

    struct Fixture {
        site: SiteConfig,
        // Held so the template file outlives the test body.
        _template: tempfile::NamedTempFile,
    }

    fn fixture() -> Fixture {
        let mut template = tempfile::NamedTempFile::new().unwrap();
        write!(template, r#"{{"resources": []}}"#).unwrap();

        let site = SiteConfig {
            resource_group: String::from("demo-rg"),
            region: String::from("East US"),
            app_name: String::from("demo-site"),
            hosting_plan: String::from("demo-plan"),
            directory: PathBuf::from("_site"),
            template_path: template.path().to_path_buf(),
            deployment_name: None,
        };

        Fixture {
            site,
            _template: template,
        }
    }

    fn fast_provisioner<A: ManagementApi>(api: &A) -> SiteProvisioner<'_, A> {
        SiteProvisioner::new(api).with_poll_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn existing_infrastructure_skips_provisioning() {
        let api = MockApi::new(true, true, RgExistence::Exists);
        let fx = fixture();

        let outcome = fast_provisioner(&api)
            .ensure_site(&fx.site, "demo-deploy")
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Existing);
        assert_eq!(api.rg_checks.load(Ordering::SeqCst), 0);
        assert_eq!(api.rg_creates.load(Ordering::SeqCst), 0);
        assert_eq!(api.deployment_creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_site_triggers_one_existence_check_then_create() {
        let api = MockApi::new(true, false, RgExistence::Absent);
        let fx = fixture();

        let outcome = fast_provisioner(&api)
            .ensure_site(&fx.site, "demo-deploy")
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Provisioned);
        assert_eq!(api.rg_checks.load(Ordering::SeqCst), 1);
        assert_eq!(api.rg_creates.load(Ordering::SeqCst), 1);
        assert_eq!(api.deployment_creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absence_surfaced_as_error_still_creates_exactly_once() {
        let api = MockApi::new(false, false, RgExistence::AbsentAsError);
        let fx = fixture();

        fast_provisioner(&api)
            .ensure_site(&fx.site, "demo-deploy")
            .await
            .unwrap();

        assert_eq!(api.rg_creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_resource_group_is_not_recreated() {
        let api = MockApi::new(true, false, RgExistence::Exists);
        let fx = fixture();

        fast_provisioner(&api)
            .ensure_site(&fx.site, "demo-deploy")
            .await
            .unwrap();

        assert_eq!(api.rg_creates.load(Ordering::SeqCst), 0);
        assert_eq!(api.deployment_creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_not_found_probe_failure_aborts_without_provisioning() {
        struct FailingApi(MockApi);

        #[async_trait]
        impl ManagementApi for FailingApi {
            async fn resource_group_exists(&self, name: &str) -> Result<bool> {
                self.0.resource_group_exists(name).await
            }
            async fn create_resource_group(&self, name: &str, region: &str) -> Result<()> {
                self.0.create_resource_group(name, region).await
            }
            async fn create_deployment(
                &self,
                resource_group: &str,
                name: &str,
                request: &DeploymentRequest,
            ) -> Result<()> {
                self.0.create_deployment(resource_group, name, request).await
            }
            async fn get_deployment(
                &self,
                resource_group: &str,
                name: &str,
            ) -> Result<Deployment> {
                self.0.get_deployment(resource_group, name).await
            }
            async fn delete_resource_group(&self, name: &str) -> Result<()> {
                self.0.delete_resource_group(name).await
            }
            async fn get_web_space(&self, _name: &str) -> Result<WebSpace> {
                Err(PublishError::Azure(AzureError::request(500, "boom")))
            }
            async fn get_web_site(&self, web_space: &str, name: &str) -> Result<WebSite> {
                self.0.get_web_site(web_space, name).await
            }
            async fn list_publish_profiles(
                &self,
                web_space: &str,
                site: &str,
            ) -> Result<Vec<PublishProfile>> {
                self.0.list_publish_profiles(web_space, site).await
            }
        }

        let api = FailingApi(MockApi::new(true, true, RgExistence::Exists));
        let fx = fixture();

        let err = fast_provisioner(&api)
            .ensure_site(&fx.site, "demo-deploy")
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Azure(AzureError::RequestFailed { .. })));
        assert_eq!(api.0.rg_creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn polling_resolves_on_third_check_and_stops() {
        let api = MockApi::new(true, true, RgExistence::Exists).with_states(vec![
            ProvisioningState::Running,
            ProvisioningState::Running,
            ProvisioningState::Succeeded,
        ]);

        fast_provisioner(&api)
            .wait_for_deployment("demo-rg", "demo-deploy")
            .await
            .unwrap();

        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_state_stops_polling_immediately() {
        let api = MockApi::new(true, true, RgExistence::Exists)
            .with_states(vec![ProvisioningState::Failed]);

        let err = fast_provisioner(&api)
            .wait_for_deployment("demo-rg", "demo-deploy")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::Azure(AzureError::DeploymentFailed { .. })
        ));
        assert_eq!(api.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn poll_bound_produces_timeout() {
        let api = MockApi::new(true, true, RgExistence::Exists)
            .with_states(vec![ProvisioningState::Running]);

        let err = fast_provisioner(&api)
            .with_max_poll_attempts(3)
            .wait_for_deployment("demo-rg", "demo-deploy")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::Azure(AzureError::DeploymentTimeout { attempts: 3, .. })
        ));
        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_template_is_a_config_error() {
        let api = MockApi::new(true, false, RgExistence::Exists);
        let mut fx = fixture();

        let mut bad_template = tempfile::NamedTempFile::new().unwrap();
        write!(bad_template, "not json").unwrap();
        fx.site.template_path = bad_template.path().to_path_buf();

        let err = fast_provisioner(&api)
            .ensure_site(&fx.site, "demo-deploy")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::Config(ConfigError::InvalidTemplate { .. })
        ));
    }
}
