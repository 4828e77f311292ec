// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are flagged
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![warn(missing_docs)]                // All public items should be documented
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::redundant_clone)]     // Useless clones warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Sitewright
//!
//! Static-site publishing for Azure Web Apps: provision the hosting
//! infrastructure when it is absent, then mirror the built site onto the
//! remote filesystem over FTPS.
//!
//! ## Pipeline
//!
//! One publish run drives a strictly sequential pipeline; each stage's
//! success gates the next and the first failure reaches the caller
//! unchanged:
//!
//! 1. Validate the configuration (before any network call).
//! 2. Exchange credentials for a management token.
//! 3. Probe the web space and site; provision the resource group and
//!    deploy the site template only when something is missing, polling
//!    the deployment to a terminal state.
//! 4. Fetch the FTP publish profile for the site.
//! 5. Walk the local site root and mirror it under `/site/wwwroot`:
//!    every remote directory is created before any file upload begins.
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing and validation
//! - [`azure`]: Credential acquisition, management client, provisioning
//! - [`transfer`]: Directory walking and FTPS content mirroring
//! - [`publisher`]: The pipeline itself, plus explicit cleanup
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! auth:
//!   authority_url: https://login.microsoftonline.com/contoso.onmicrosoft.com
//!   client_id: 11111111-2222-3333-4444-555555555555
//!   subscription_id: aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee
//!
//! site:
//!   resource_group: contoso-sites
//!   region: East US
//!   app_name: contoso-www
//!   hosting_plan: contoso-plan
//!   directory: ./_site
//!   template_path: ./arm/site-template.json
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod azure;
pub mod cli;
pub mod config;
pub mod error;
pub mod publisher;
pub mod transfer;

// ============================================================================
// Re-exports
// ============================================================================

pub use azure::{
    ArmClient, AzureCredentials, EnsureOutcome, ManagementApi, ProvisioningState,
    PublishEndpoint, PublishProfile, SiteProvisioner, TokenAcquirer,
};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, PublishConfig};
pub use error::{PublishError, Result};
pub use publisher::{cleanup, publish, PublishOutcome, Publisher};
pub use transfer::{
    ContentUploader, DirectoryWalker, FtpsConnector, SiteTree, TransferConnector, TransferSession,
};
