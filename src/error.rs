//! Error types for the Sitewright publishing pipeline.
//!
//! This module provides the error hierarchy for all stages of a publish
//! run: configuration, credential acquisition, Azure management calls,
//! and content transfer.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Sitewright publishing pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential acquisition errors.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Azure management API errors.
    #[error("Azure API error: {0}")]
    Azure(#[from] AzureError),

    /// Content transfer errors.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Local filesystem errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// The deployment template could not be read or parsed.
    #[error("Invalid deployment template {path}: {message}")]
    InvalidTemplate {
        /// Path to the template file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },
}

/// Credential acquisition errors.
///
/// A rejection from the identity provider is never retried: the
/// credentials are either valid or they are not.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider rejected the credential grant.
    #[error("Identity provider rejected credentials: {message}")]
    Rejected {
        /// Error description from the identity provider.
        message: String,
    },

    /// The token response could not be understood.
    #[error("Invalid token response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// Network error reaching the identity provider.
    #[error("Network error reaching identity provider: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },
}

/// Azure management API errors.
#[derive(Debug, Error)]
pub enum AzureError {
    /// A management resource does not exist.
    ///
    /// During the provisioning-decision checks this is a benign branch
    /// signal; everywhere else it is fatal like any other error.
    #[error("{resource} not found: {name}")]
    ResourceNotFound {
        /// Kind of resource (resource group, web space, site, deployment).
        resource: String,
        /// Name of the missing resource.
        name: String,
    },

    /// The management API rejected a request.
    #[error("Azure management request failed: {status} - {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network error reaching the management API.
    #[error("Network error communicating with Azure: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// A response could not be understood.
    #[error("Invalid response from Azure management API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// The template deployment reached the terminal `Failed` state.
    #[error("Template deployment '{deployment}' failed in resource group '{resource_group}'")]
    DeploymentFailed {
        /// Resource group name.
        resource_group: String,
        /// Deployment name.
        deployment: String,
    },

    /// The template deployment did not reach a terminal state in time.
    #[error(
        "Template deployment '{deployment}' did not complete after {attempts} status checks"
    )]
    DeploymentTimeout {
        /// Deployment name.
        deployment: String,
        /// Number of status checks performed.
        attempts: u32,
    },

    /// No publish profile matches the configured transfer protocol.
    #[error("No {method} publish profile available for site '{site}'")]
    MissingPublishProfile {
        /// Site name.
        site: String,
        /// Requested publish method.
        method: String,
    },
}

/// Content transfer errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The transfer endpoint could not be parsed from the publish profile.
    #[error("Invalid transfer endpoint '{url}': {message}")]
    InvalidEndpoint {
        /// The offending URL.
        url: String,
        /// Description of the problem.
        message: String,
    },

    /// The secure session could not be established.
    #[error("Failed to connect to {host}: {message}")]
    Connect {
        /// Target host.
        host: String,
        /// Description of the failure.
        message: String,
    },

    /// A session-level operation failed.
    #[error("Transfer session error: {message}")]
    Session {
        /// Description of the failure.
        message: String,
    },

    /// A remote directory could not be created.
    #[error("Failed to create remote directory '{path}': {message}")]
    MakeDir {
        /// Remote directory path.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// A file upload failed.
    #[error("Failed to upload '{remote}': {message}")]
    Upload {
        /// Remote file path.
        remote: String,
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for Sitewright operations.
pub type Result<T> = std::result::Result<T, PublishError>;

impl PublishError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is a not-found signal from the
    /// management API.
    ///
    /// Only the provisioning-decision checks treat this as benign; the
    /// match is deliberately narrow so that other failures carrying a 404
    /// surface (an expired token behind a misbehaving proxy, for example)
    /// stay fatal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Azure(AzureError::ResourceNotFound { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl AzureError {
    /// Creates a request error.
    #[must_use]
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a not-found error for a named resource.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
            name: name.into(),
        }
    }
}

impl TransferError {
    /// Creates a session error with the given message.
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classifier_matches_only_resource_not_found() {
        let err = PublishError::Azure(AzureError::not_found("resource group", "demo-rg"));
        assert!(err.is_not_found());

        let err = PublishError::Azure(AzureError::request(404, "gateway mangled this"));
        assert!(!err.is_not_found());

        let err = PublishError::Auth(AuthError::Rejected {
            message: String::from("bad password"),
        });
        assert!(!err.is_not_found());
    }
}
