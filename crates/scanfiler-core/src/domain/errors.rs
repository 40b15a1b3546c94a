//! Domain error types
//!
//! This module defines configuration errors: missing settings and invalid
//! per-tenant storage selections.

use thiserror::Error;

/// Errors caused by missing or inconsistent configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent or empty
    #[error("Missing setting: {0}")]
    MissingSetting(String),

    /// The tenant has no storage backend configured
    #[error("No cloud storage provider set for user {tenant}")]
    NoStorageBackend {
        /// Tenant folder name
        tenant: String,
    },

    /// The tenant has more than one storage backend configured
    #[error("More than one cloud storage provider set for user {tenant}: {}", providers.join(", "))]
    MultipleStorageBackends {
        /// Tenant folder name
        tenant: String,
        /// Names of the configured providers
        providers: Vec<String>,
    },

    /// The folder name does not match any configured user
    #[error("Unknown user: {0}")]
    UnknownTenant(String),
}
