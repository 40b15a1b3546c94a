//! Storage backend port (driven/secondary port)
//!
//! Each provider implements [`IStorageBackend`] for its own settings type,
//! so a backend can never be invoked with another provider's credentials.
//! Selection between providers happens in
//! [`StorageDispatcher`](crate::usecases::StorageDispatcher).
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result`; the dispatcher surfaces backend errors unchanged.
//! - Backends do not retry. A failed upload is retried by the pipeline, which
//!   restarts from the download.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Destination, Tenant};

// ============================================================================
// StoredFile
// ============================================================================

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Retrievable locator (web URL) for the stored document
    pub locator: String,
    /// Provider-specific file identifier, if reported
    pub file_id: Option<String>,
    /// Content fingerprint (e.g. ETag), if reported
    pub fingerprint: Option<String>,
    /// Human-readable provider name, e.g. `Nextcloud`
    pub provider: String,
}

// ============================================================================
// IStorageBackend
// ============================================================================

/// Stores documents with one storage provider
#[async_trait]
pub trait IStorageBackend<S: Sync>: Send + Sync {
    /// Human-readable provider name
    fn provider_name(&self) -> &'static str;

    /// Stores `data` at `destination` on behalf of `tenant`
    ///
    /// Missing folders on the way to the destination are created.
    async fn store(
        &self,
        tenant: &Tenant,
        settings: &S,
        destination: &Destination,
        data: &[u8],
    ) -> anyhow::Result<StoredFile>;
}
