//! Tenants and their storage selection
//!
//! A tenant is the owner of one folder under the watched remote root. The
//! folder name is the tenant's identity. Each tenant has a notification
//! identity and must select exactly one storage backend; the selection is
//! resolved into the closed [`StorageBackend`] choice when a document is
//! uploaded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// Credentials for a Nextcloud (WebDAV) account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextcloudSettings {
    /// Base URL of the Nextcloud instance, e.g. `https://cloud.example.com`
    pub url: String,
    /// Nextcloud user name
    pub username: String,
    /// Password or app password
    pub password: String,
}

impl std::fmt::Debug for NextcloudSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextcloudSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Google Drive account selection
///
/// The refresh token is not part of the configuration: it is looked up in
/// the token store under `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleDriveSettings {
    /// Google account e-mail the token was stored under
    pub email: String,
}

/// Per-tenant settings as written in the `users` section of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Telegram user name (or numeric chat id) receiving status messages
    #[serde(default)]
    pub telegram: Option<String>,
    /// Nextcloud storage selection
    #[serde(default)]
    pub nextcloud: Option<NextcloudSettings>,
    /// Google Drive storage selection
    #[serde(default)]
    pub google_drive: Option<GoogleDriveSettings>,
}

/// The storage backend selected by a tenant
///
/// Closed over the supported providers; each variant carries its own
/// credential payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Upload through Nextcloud WebDAV
    Nextcloud(NextcloudSettings),
    /// Upload through the Google Drive API
    GoogleDrive(GoogleDriveSettings),
}

impl StorageBackend {
    /// Human-readable provider name, used in messages
    pub fn provider_name(&self) -> &'static str {
        match self {
            StorageBackend::Nextcloud(_) => "Nextcloud",
            StorageBackend::GoogleDrive(_) => "Google Drive",
        }
    }
}

impl TenantSettings {
    /// Resolves the single configured storage backend
    ///
    /// # Errors
    ///
    /// `NoStorageBackend` if none is configured, `MultipleStorageBackends` if
    /// more than one is.
    pub fn storage_backend(&self, tenant: &str) -> Result<StorageBackend, ConfigError> {
        match (&self.nextcloud, &self.google_drive) {
            (Some(nc), None) => Ok(StorageBackend::Nextcloud(nc.clone())),
            (None, Some(gd)) => Ok(StorageBackend::GoogleDrive(gd.clone())),
            (None, None) => Err(ConfigError::NoStorageBackend {
                tenant: tenant.to_string(),
            }),
            (Some(_), Some(_)) => Err(ConfigError::MultipleStorageBackends {
                tenant: tenant.to_string(),
                providers: vec!["nextcloud".to_string(), "google_drive".to_string()],
            }),
        }
    }
}

/// A tenant as seen by the watch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    name: String,
    settings: Option<TenantSettings>,
}

impl Tenant {
    /// Creates a configured tenant
    pub fn new(name: impl Into<String>, settings: TenantSettings) -> Self {
        Self {
            name: name.into(),
            settings: Some(settings),
        }
    }

    /// Creates a tenant for a folder with no matching `users` entry
    pub fn unconfigured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: None,
        }
    }

    /// Folder name identifying the tenant
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the tenant has a `users` entry
    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    /// Notification identity, if any
    pub fn notify_identity(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| s.telegram.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Resolves the tenant's storage backend
    pub fn storage_backend(&self) -> Result<StorageBackend, ConfigError> {
        match &self.settings {
            Some(settings) => settings.storage_backend(&self.name),
            None => Err(ConfigError::UnknownTenant(self.name.clone())),
        }
    }
}

/// Read-only set of tenants loaded at startup
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    tenants: BTreeMap<String, TenantSettings>,
}

impl TenantRegistry {
    /// Builds the registry from the `users` section of the config
    pub fn new(tenants: BTreeMap<String, TenantSettings>) -> Self {
        Self { tenants }
    }

    /// Looks up the tenant owning `folder`
    ///
    /// Folders without a `users` entry yield an unconfigured tenant, whose
    /// uploads fail with [`ConfigError::UnknownTenant`].
    pub fn get(&self, folder: &str) -> Tenant {
        match self.tenants.get(folder) {
            Some(settings) => Tenant::new(folder, settings.clone()),
            None => Tenant::unconfigured(folder),
        }
    }

    /// Returns every configured tenant whose storage selection is invalid
    pub fn storage_problems(&self) -> Vec<ConfigError> {
        self.tenants
            .iter()
            .filter_map(|(name, settings)| settings.storage_backend(name).err())
            .collect()
    }

    /// Number of configured tenants
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    /// Returns true if no tenant is configured
    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
