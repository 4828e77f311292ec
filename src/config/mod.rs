//! Configuration module for the Sitewright publishing pipeline.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `sitewright.publish.yaml`
//! - Environment variable overrides and `.env` loading
//! - Validation of configuration values before any network call

mod spec;
mod parser;
mod validator;

pub use spec::{AuthConfig, PublishConfig, SiteConfig, TransferConfig};
pub use parser::{ConfigParser, find_config_file};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
