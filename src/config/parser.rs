//! Configuration parser for loading and merging configuration files.
//!
//! This module handles loading configuration from YAML files and
//! environment variables, with proper precedence and error handling.
//! Environment values win over file values so that secrets never have to
//! live in the YAML.

use crate::error::{ConfigError, PublishError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::PublishConfig;

/// Configuration parser for loading publish configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PublishConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(PublishError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PublishError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<PublishConfig> {
        debug!("Parsing YAML configuration");

        let config: PublishConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            PublishError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Successfully parsed configuration for site: {}",
            config.site.app_name
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<PublishConfig> {
        let mut config = self.load_file(path)?;

        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(config: &mut PublishConfig) {
        // Credential overrides
        if let Ok(username) = std::env::var("SITEWRIGHT_AZURE_USERNAME") {
            debug!("Overriding auth.username from environment");
            config.auth.username = Some(username);
        }

        if let Ok(password) = std::env::var("SITEWRIGHT_AZURE_PASSWORD") {
            debug!("Overriding auth.password from environment");
            config.auth.password = Some(password);
        }

        if let Ok(client_id) = std::env::var("SITEWRIGHT_CLIENT_ID") {
            debug!("Overriding auth.client_id from environment");
            config.auth.client_id = client_id;
        }

        if let Ok(subscription_id) = std::env::var("SITEWRIGHT_SUBSCRIPTION_ID") {
            debug!("Overriding auth.subscription_id from environment");
            config.auth.subscription_id = subscription_id;
        }

        // Site overrides
        if let Ok(directory) = std::env::var("SITEWRIGHT_SITE_DIRECTORY") {
            debug!("Overriding site.directory from environment");
            config.site.directory = directory.into();
        }

        // Transfer credential fallbacks
        if let Ok(user) = std::env::var("SITEWRIGHT_DEPLOYMENT_USER") {
            debug!("Overriding transfer.username from environment");
            config.transfer.username = Some(user);
        }

        if let Ok(password) = std::env::var("SITEWRIGHT_DEPLOYMENT_PASSWORD") {
            debug!("Overriding transfer.password from environment");
            config.transfer.password = Some(password);
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                PublishError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "sitewright.publish.yaml",
    "sitewright.publish.yml",
    "publish.yaml",
    "publish.yml",
];

/// Finds the configuration file in the current directory or parent directories.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(PublishError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
auth:
  authority_url: https://login.microsoftonline.com/common
  client_id: 11111111-2222-3333-4444-555555555555
  subscription_id: aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee
site:
  resource_group: demo-rg
  region: East US
  app_name: demo-site
  hosting_plan: demo-plan
  directory: ./_site
  template_path: ./arm/site.json
";
        let parser = ConfigParser::new();
        let result = parser.parse_yaml(yaml, None);
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.site.app_name, "demo-site");
        assert_eq!(config.auth.username, None);
        assert_eq!(config.site.deployment_name, None);
        assert_eq!(config.transfer, crate::config::TransferConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
auth:
  authority_url: https://login.microsoftonline.com/contoso.onmicrosoft.com
  client_id: 11111111-2222-3333-4444-555555555555
  subscription_id: aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee
  username: publisher@contoso.com
  password: hunter2

site:
  resource_group: contoso-sites
  region: West Europe
  app_name: contoso-www
  hosting_plan: contoso-plan
  directory: ./build
  template_path: ./arm/static-site.json
  deployment_name: contoso-www-rollout

transfer:
  username: contoso-www\deployer
";
        let parser = ConfigParser::new();
        let result = parser.parse_yaml(yaml, None);
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.site.resource_group, "contoso-sites");
        assert_eq!(config.site.web_space_name(), "contoso-sites-WestEuropewebspace");
        assert_eq!(
            config.site.deployment_name.as_deref(),
            Some("contoso-www-rollout")
        );
        assert_eq!(config.auth.username.as_deref(), Some("publisher@contoso.com"));
        assert_eq!(config.transfer.username.as_deref(), Some("contoso-www\\deployer"));
    }

    #[test]
    fn test_invalid_yaml_is_a_parse_error() {
        let parser = ConfigParser::new();
        let result = parser.parse_yaml("site: [not, a, mapping", None);
        assert!(matches!(
            result,
            Err(PublishError::Config(ConfigError::ParseError { .. }))
        ));
    }
}
