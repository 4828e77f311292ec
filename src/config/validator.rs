//! Configuration validation for publish runs.
//!
//! Validation runs before any network call: a configuration missing a
//! required field must fail fast with a [`ConfigError`], never after a
//! token has been requested or a management client constructed.

use crate::error::{ConfigError, PublishError, Result};
use tracing::debug;

use super::spec::{AuthConfig, PublishConfig, SiteConfig};

/// Validator for publish configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a publish configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::ValidationError`] carrying the first
    /// failure if any required field is missing or malformed.
    pub fn validate(&self, config: &PublishConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_auth(&config.auth, &mut result);
        Self::validate_site(&config.site, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(PublishError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Validates the credential section.
    fn validate_auth(auth: &AuthConfig, result: &mut ValidationResult) {
        if auth.authority_url.trim().is_empty() {
            result.error("auth.authority_url", "authority URL must not be empty");
        } else if !auth.authority_url.starts_with("https://") {
            result.error(
                "auth.authority_url",
                "authority URL must use the https scheme",
            );
        }

        if auth.client_id.trim().is_empty() {
            result.error("auth.client_id", "client id must not be empty");
        }

        if auth.subscription_id.trim().is_empty() {
            result.error("auth.subscription_id", "subscription id must not be empty");
        }

        if auth.username.as_deref().is_none_or(str::is_empty) {
            result.error(
                "auth.username",
                "username is required; set SITEWRIGHT_AZURE_USERNAME or auth.username",
            );
        }

        if auth.password.as_deref().is_none_or(str::is_empty) {
            result.error(
                "auth.password",
                "password is required; set SITEWRIGHT_AZURE_PASSWORD or auth.password",
            );
        }
    }

    /// Validates the site section.
    fn validate_site(site: &SiteConfig, result: &mut ValidationResult) {
        if site.resource_group.trim().is_empty() {
            result.error("site.resource_group", "resource group must not be empty");
        }

        if site.region.trim().is_empty() {
            result.error("site.region", "region must not be empty");
        }

        if site.app_name.trim().is_empty() {
            result.error("site.app_name", "app name must not be empty");
        }

        if site.hosting_plan.trim().is_empty() {
            result.error("site.hosting_plan", "hosting plan must not be empty");
        }

        if site.directory.as_os_str().is_empty() {
            result.error("site.directory", "site directory must not be empty");
        } else if !site.directory.exists() {
            result.warnings.push(format!(
                "site directory '{}' does not exist yet; it must at publish time",
                site.directory.display()
            ));
        }

        if site.template_path.as_os_str().is_empty() {
            result.error("site.template_path", "template path must not be empty");
        } else if !site.template_path.exists() {
            result.warnings.push(format!(
                "deployment template '{}' does not exist yet; it must at publish time",
                site.template_path.display()
            ));
        }
    }
}
