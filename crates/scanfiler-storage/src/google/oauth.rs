//! OAuth2 client for Google APIs
//!
//! The client is configured from the JSON file offered for download in the
//! Google Cloud console (`{"web": {...}}` or `{"installed": {...}}`). Only the
//! `drive.file` scope is requested: the application sees the files it
//! created itself.

use std::path::Path;

use oauth2::{
    basic::BasicClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::StorageError;

/// Scope granting access to files created by this application
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Client section of the credentials file
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

/// Top level of the credentials file
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    web: Option<ClientSecrets>,
    installed: Option<ClientSecrets>,
}

/// Short-lived access token obtained from a refresh token
#[derive(Debug, Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

/// Tokens granted by the consent flow
#[derive(Debug, Clone)]
pub struct GrantedToken {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
    pub token_type: String,
}

/// OAuth2 client for the Google authorization server
pub struct GoogleOAuth {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    http: reqwest::Client,
}

impl GoogleOAuth {
    /// Creates a client from explicit endpoint values
    pub fn new(
        client_id: &str,
        client_secret: &str,
        auth_uri: &str,
        token_uri: &str,
        redirect_url: &str,
    ) -> Result<Self, StorageError> {
        let invalid = |what: &str, e: url::ParseError| {
            StorageError::Credentials(format!("invalid {what}: {e}"))
        };

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_auth_type(AuthType::RequestBody)
            .set_auth_uri(
                AuthUrl::new(auth_uri.to_string()).map_err(|e| invalid("auth_uri", e))?,
            )
            .set_token_uri(
                TokenUrl::new(token_uri.to_string()).map_err(|e| invalid("token_uri", e))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_url.to_string())
                    .map_err(|e| invalid("redirect_url", e))?,
            );

        // Token requests must not follow redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, http })
    }

    /// Creates a client from the contents of a credentials file
    pub fn from_json(json: &str, redirect_url: &str) -> Result<Self, StorageError> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| StorageError::Credentials(e.to_string()))?;
        let secrets = file.web.or(file.installed).ok_or_else(|| {
            StorageError::Credentials("expected a \"web\" or \"installed\" section".to_string())
        })?;

        Self::new(
            &secrets.client_id,
            &secrets.client_secret,
            &secrets.auth_uri,
            &secrets.token_uri,
            redirect_url,
        )
    }

    /// Reads the credentials file at `path`
    pub fn from_file(path: &Path, redirect_url: &str) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json, redirect_url)
    }

    /// Builds the consent URL, asking for offline access
    pub fn authorize_url(&self) -> String {
        let (url, _csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_FILE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        url.to_string()
    }

    /// Exchanges an authorization code from the consent redirect
    pub async fn exchange_code(&self, code: &str) -> Result<GrantedToken, StorageError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| StorageError::OAuth(e.to_string()))?;

        info!("Exchanged authorization code for Google tokens");
        Ok(GrantedToken {
            access_token: AccessToken::new(response.access_token().secret().as_str()),
            refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
            token_type: response.token_type().as_ref().to_string(),
        })
    }

    /// Obtains a fresh access token for a stored refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, StorageError> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| StorageError::OAuth(e.to_string()))?;

        debug!("Refreshed Google access token");
        Ok(AccessToken::new(response.access_token().secret().as_str()))
    }
}
