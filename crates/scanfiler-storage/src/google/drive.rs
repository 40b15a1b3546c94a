//! GoogleDriveBackend - document upload through the Drive v3 API
//!
//! For every upload:
//! 1. The tenant's refresh token is looked up by Google e-mail and exchanged
//!    for an access token.
//! 2. The folder path `<root>/<category>` is resolved segment by segment from
//!    the Drive root, creating missing folders.
//! 3. The document is sent as a `multipart/related` upload into the category
//!    folder; the returned `webViewLink` is the locator.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use scanfiler_core::domain::{Destination, GoogleDriveSettings, Tenant};
use scanfiler_core::ports::{IStorageBackend, StoredFile};

use super::oauth::{AccessToken, GoogleOAuth};
use super::token_store::SqliteTokenStore;
use crate::StorageError;

const PROVIDER: &str = "Google Drive";

/// Base URL of the Drive v3 metadata API
const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";

/// Base URL of the Drive v3 upload API
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

// ============================================================================
// Drive API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct About {
    user: AboutUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutUser {
    email_address: String,
}

// ============================================================================
// DriveApi
// ============================================================================

/// Minimal Drive v3 client
#[derive(Debug, Clone)]
pub struct DriveApi {
    client: Client,
    api_url: String,
    upload_url: String,
}

impl Default for DriveApi {
    fn default() -> Self {
        Self::with_base_urls(DRIVE_API_URL, DRIVE_UPLOAD_URL)
    }
}

impl DriveApi {
    /// Creates a client with custom base URLs (useful for testing)
    pub fn with_base_urls(api_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            upload_url: upload_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the e-mail address of the account owning `token`
    pub async fn account_email(&self, token: &AccessToken) -> Result<String, StorageError> {
        let response = self
            .client
            .get(format!("{}/about", self.api_url))
            .query(&[("fields", "user")])
            .bearer_auth(token.secret())
            .send()
            .await?;
        let about: About = parse(response).await?;
        Ok(about.user.email_address)
    }

    /// Finds the folder `name` directly below `parent`
    pub async fn find_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent: &str,
    ) -> Result<Option<String>, StorageError> {
        let query = format!(
            "mimeType='{FOLDER_MIME_TYPE}' and name='{}' and '{}' in parents and trashed=false",
            escape_query(name),
            escape_query(parent)
        );
        let response = self
            .client
            .get(format!("{}/files", self.api_url))
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id)"),
                ("spaces", "drive"),
            ])
            .bearer_auth(token.secret())
            .send()
            .await?;
        let list: FileList = parse(response).await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Creates the folder `name` below `parent` and returns its id
    pub async fn create_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .post(format!("{}/files", self.api_url))
            .query(&[("fields", "id")])
            .bearer_auth(token.secret())
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent],
            }))
            .send()
            .await?;
        let file: DriveFile = parse(response).await?;
        debug!(name, id = %file.id, "Created Drive folder");
        Ok(file.id)
    }

    /// Resolves `segments` from the Drive root, creating missing folders
    pub async fn ensure_folder_path(
        &self,
        token: &AccessToken,
        segments: &[&str],
    ) -> Result<String, StorageError> {
        let mut parent = "root".to_string();
        for segment in segments {
            parent = match self.find_folder(token, segment, &parent).await? {
                Some(id) => id,
                None => self.create_folder(token, segment, &parent).await?,
            };
        }
        Ok(parent)
    }

    /// Uploads `data` as `name` into the folder `parent`
    pub async fn upload(
        &self,
        token: &AccessToken,
        name: &str,
        parent: &str,
        data: &[u8],
    ) -> Result<(String, Option<String>), StorageError> {
        let boundary = format!("scanfiler-{}", uuid::Uuid::new_v4().simple());
        let metadata = serde_json::json!({ "name": name, "parents": [parent] });
        let body = multipart_related(&boundary, &metadata, mime_type(name), data);

        let response = self
            .client
            .post(format!("{}/files", self.upload_url))
            .query(&[("uploadType", "multipart"), ("fields", "id,webViewLink")])
            .bearer_auth(token.secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let file: DriveFile = parse(response).await?;
        Ok((file.id, file.web_view_link))
    }
}

/// Checks the status and decodes a JSON body
async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::Http {
            provider: PROVIDER,
            status,
            body: response.text().await.unwrap_or_default(),
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::InvalidResponse {
        provider: PROVIDER,
        message: e.to_string(),
    })
}

/// Escapes a value for use inside a single-quoted Drive query string
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn mime_type(name: &str) -> &'static str {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

/// Builds a two-part `multipart/related` body: JSON metadata, then content
fn multipart_related(
    boundary: &str,
    metadata: &serde_json::Value,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: {content_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

// ============================================================================
// GoogleDriveBackend
// ============================================================================

/// Storage backend for Google Drive accounts
pub struct GoogleDriveBackend {
    oauth: Arc<GoogleOAuth>,
    tokens: SqliteTokenStore,
    api: DriveApi,
}

impl GoogleDriveBackend {
    pub fn new(oauth: Arc<GoogleOAuth>, tokens: SqliteTokenStore) -> Self {
        Self::with_api(oauth, tokens, DriveApi::default())
    }

    /// Creates a backend talking to a custom Drive endpoint
    pub fn with_api(oauth: Arc<GoogleOAuth>, tokens: SqliteTokenStore, api: DriveApi) -> Self {
        Self { oauth, tokens, api }
    }

    /// Uploads `data` to `destination` in the account `settings.email`
    pub async fn upload(
        &self,
        settings: &GoogleDriveSettings,
        destination: &Destination,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let stored = self
            .tokens
            .get(&settings.email)
            .await?
            .ok_or_else(|| StorageError::MissingToken(settings.email.clone()))?;
        let token = self.oauth.refresh(&stored.refresh_token).await?;

        let folder = self
            .api
            .ensure_folder_path(&token, &destination.folder_segments())
            .await?;
        let (id, link) = self
            .api
            .upload(&token, destination.file_name(), &folder, data)
            .await?;

        let locator = link.unwrap_or_else(|| format!("https://drive.google.com/file/d/{id}/view"));
        info!(path = %destination, file_id = %id, "Uploaded file to Google Drive");
        Ok(StoredFile {
            locator,
            file_id: Some(id),
            fingerprint: None,
            provider: PROVIDER.to_string(),
        })
    }
}

#[async_trait]
impl IStorageBackend<GoogleDriveSettings> for GoogleDriveBackend {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn store(
        &self,
        _tenant: &Tenant,
        settings: &GoogleDriveSettings,
        destination: &Destination,
        data: &[u8],
    ) -> anyhow::Result<StoredFile> {
        Ok(self.upload(settings, destination, data).await?)
    }
}
