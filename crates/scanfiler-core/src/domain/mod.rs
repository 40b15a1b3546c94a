//! Domain entities and business logic
//!
//! This module contains the core domain types for scanfiler:
//! - Remote listing entries and the per-tenant known-file set
//! - Classification results and destination naming
//! - Tenant settings and the closed storage backend choice
//! - Per-file processing attempts
//! - Domain-specific error types

pub mod attempt;
pub mod classification;
pub mod destination;
pub mod entry;
pub mod errors;
pub mod tenant;

// Re-export commonly used types
pub use attempt::ProcessingAttempt;
pub use classification::{truncate_chars, Classification};
pub use destination::Destination;
pub use entry::{EntryKind, KnownSet, RemoteEntry};
pub use errors::ConfigError;
pub use tenant::{
    GoogleDriveSettings, NextcloudSettings, StorageBackend, Tenant, TenantRegistry,
    TenantSettings,
};
