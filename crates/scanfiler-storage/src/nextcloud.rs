//! NextcloudBackend - document upload through Nextcloud WebDAV
//!
//! Files are written with `PUT {url}/remote.php/dav/files/{user}/{path}`
//! using basic auth. Missing collections on the way to the destination are
//! created with `MKCOL`; a `405` answer means the collection exists already.
//!
//! The locator is the Nextcloud short link `{url}/f/{oc-fileid}`; the
//! `oc-etag` response header is kept as content fingerprint.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, info};
use url::Url;

use scanfiler_core::domain::{Destination, NextcloudSettings, Tenant};
use scanfiler_core::ports::{IStorageBackend, StoredFile};

use crate::StorageError;

const PROVIDER: &str = "Nextcloud";

/// Storage backend for Nextcloud accounts
#[derive(Debug, Clone, Default)]
pub struct NextcloudBackend {
    client: Client,
}

impl NextcloudBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Uploads `data` to `destination` in the account described by `settings`
    pub async fn upload(
        &self,
        settings: &NextcloudSettings,
        destination: &Destination,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let mut folders = Vec::new();
        for segment in destination.folder_segments() {
            folders.push(segment);
            self.ensure_collection(settings, &folders).await?;
        }

        let mut segments = folders.clone();
        segments.push(destination.file_name());
        let url = dav_url(settings, &segments)?;

        debug!(url = %url, bytes = data.len(), "Uploading file to Nextcloud");
        let response = self
            .client
            .put(url.clone())
            .basic_auth(&settings.username, Some(&settings.password))
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED && status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Http {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_matches('"').to_string())
        };
        let file_id = header("oc-fileid");
        let fingerprint = header("oc-etag");

        let locator = match &file_id {
            Some(id) => format!("{}/f/{}", settings.url.trim_end_matches('/'), id),
            None => url.to_string(),
        };

        info!(path = %destination, file_id = ?file_id, "Uploaded file to Nextcloud");
        Ok(StoredFile {
            locator,
            file_id,
            fingerprint,
            provider: PROVIDER.to_string(),
        })
    }

    /// Creates the collection at `segments` unless it exists
    async fn ensure_collection(
        &self,
        settings: &NextcloudSettings,
        segments: &[&str],
    ) -> Result<(), StorageError> {
        let url = dav_url(settings, segments)?;
        let mkcol = Method::from_bytes(b"MKCOL").map_err(|e| StorageError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .request(mkcol, url.clone())
            .basic_auth(&settings.username, Some(&settings.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                debug!(url = %url, "Created collection");
                Ok(())
            }
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            status => Err(StorageError::Http {
                provider: PROVIDER,
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// Builds the WebDAV URL for `segments` below the user's files root
///
/// Segments are percent-encoded individually.
fn dav_url(settings: &NextcloudSettings, segments: &[&str]) -> Result<Url, StorageError> {
    let invalid = |message: String| StorageError::InvalidUrl {
        url: settings.url.clone(),
        message,
    };

    let mut url = Url::parse(&settings.url).map_err(|e| invalid(e.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?;
        path.pop_if_empty()
            .extend(["remote.php", "dav", "files", settings.username.as_str()])
            .extend(segments);
    }
    Ok(url)
}

#[async_trait]
impl IStorageBackend<NextcloudSettings> for NextcloudBackend {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn store(
        &self,
        _tenant: &Tenant,
        settings: &NextcloudSettings,
        destination: &Destination,
        data: &[u8],
    ) -> anyhow::Result<StoredFile> {
        Ok(self.upload(settings, destination, data).await?)
    }
}
