//! scanfiler Storage - cloud storage backends
//!
//! Implements [`IStorageBackend`](scanfiler_core::ports::IStorageBackend) for
//! the two supported providers:
//! - Nextcloud, through authenticated WebDAV writes
//! - Google Drive, through the Drive v3 API with per-user refresh tokens
//!
//! ## Modules
//!
//! - [`nextcloud`] - WebDAV backend
//! - [`google`] - OAuth client, token store, consent server and Drive backend

pub mod google;
pub mod nextcloud;

use thiserror::Error;

pub use google::{ConsentServer, GoogleDriveBackend, GoogleOAuth, SqliteTokenStore};
pub use nextcloud::NextcloudBackend;

/// Errors that can occur when storing a document
#[derive(Debug, Error)]
pub enum StorageError {
    /// The provider answered with an unexpected status
    #[error("{provider} returned {status}: {body}")]
    Http {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A URL could not be built from the configured values
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// No refresh token is stored for the account
    #[error("No Google token stored for {0}; visit /auth to grant access")]
    MissingToken(String),

    /// The OAuth token exchange failed
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The OAuth client credentials file is unusable
    #[error("Invalid Google credentials: {0}")]
    Credentials(String),

    /// The token database failed
    #[error("Token store error: {0}")]
    Database(#[from] sqlx::Error),

    /// The provider answered with a body that does not parse
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}
