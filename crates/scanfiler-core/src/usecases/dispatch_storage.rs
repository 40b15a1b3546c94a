//! Storage dispatch use case
//!
//! Resolves the tenant's single storage backend, computes the destination
//! path from the classification and the upload date, and hands the bytes to
//! the matching backend. Configuration problems are reported before any
//! backend is touched.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    Classification, ConfigError, Destination, GoogleDriveSettings, NextcloudSettings,
    StorageBackend, Tenant,
};
use crate::ports::{IStorageBackend, StoredFile};

/// Errors returned by [`StorageDispatcher::dispatch`]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The tenant's storage selection is invalid; nothing was uploaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend rejected the upload
    #[error("{0:#}")]
    Backend(anyhow::Error),
}

impl DispatchError {
    /// Returns true if retrying cannot succeed without a config change
    pub fn is_permanent(&self) -> bool {
        matches!(self, DispatchError::Config(_))
    }
}

/// Uploads classified documents to the tenant's storage backend
pub struct StorageDispatcher {
    root: String,
    nextcloud: Arc<dyn IStorageBackend<NextcloudSettings>>,
    google_drive: Arc<dyn IStorageBackend<GoogleDriveSettings>>,
}

impl StorageDispatcher {
    /// Creates a dispatcher storing documents below `root`
    pub fn new(
        root: impl Into<String>,
        nextcloud: Arc<dyn IStorageBackend<NextcloudSettings>>,
        google_drive: Arc<dyn IStorageBackend<GoogleDriveSettings>>,
    ) -> Self {
        Self {
            root: root.into(),
            nextcloud,
            google_drive,
        }
    }

    /// Destination for `classification` if uploaded on `date`
    pub fn destination(&self, classification: &Classification, date: NaiveDate) -> Destination {
        Destination::new(&self.root, classification, date)
    }

    /// Uploads `data` for `tenant`, dated today
    pub async fn dispatch(
        &self,
        tenant: &Tenant,
        classification: &Classification,
        data: &[u8],
    ) -> Result<StoredFile, DispatchError> {
        self.dispatch_on(tenant, classification, data, Local::now().date_naive())
            .await
    }

    /// Uploads `data` for `tenant` with an explicit upload date
    ///
    /// # Errors
    ///
    /// [`DispatchError::Config`] if the tenant has zero or several backends or
    /// is unknown; [`DispatchError::Backend`] with the backend's own error
    /// otherwise.
    pub async fn dispatch_on(
        &self,
        tenant: &Tenant,
        classification: &Classification,
        data: &[u8],
        date: NaiveDate,
    ) -> Result<StoredFile, DispatchError> {
        let backend = tenant.storage_backend()?;
        let destination = self.destination(classification, date);

        debug!(
            tenant = tenant.name(),
            provider = backend.provider_name(),
            destination = %destination,
            bytes = data.len(),
            "Dispatching upload"
        );

        let stored = match &backend {
            StorageBackend::Nextcloud(settings) => {
                self.nextcloud
                    .store(tenant, settings, &destination, data)
                    .await
            }
            StorageBackend::GoogleDrive(settings) => {
                self.google_drive
                    .store(tenant, settings, &destination, data)
                    .await
            }
        }
        .map_err(DispatchError::Backend)?;

        info!(
            tenant = tenant.name(),
            provider = %stored.provider,
            locator = %stored.locator,
            "Document stored"
        );
        Ok(stored)
    }
}
