//! Configuration module for scanfiler.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{TenantRegistry, TenantSettings};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for scanfiler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub watch: WatchConfig,
    pub ocr: OcrConfig,
    pub classifier: ClassifierConfig,
    pub telegram: TelegramConfig,
    pub storage: StorageConfig,
    pub google: GoogleConfig,
    pub logging: LoggingConfig,
    /// Tenants keyed by their folder name under `remote.path`.
    pub users: BTreeMap<String, TenantSettings>,
}

/// FTP server holding the per-user scan folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Root directory containing one folder per user.
    pub path: String,
    /// Seconds to wait for the TCP connection.
    pub connect_timeout_secs: u64,
    /// Seconds a single read or write on the control connection may block.
    pub io_timeout_secs: u64,
}

/// Watch loop timing and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between two polls of the remote tree.
    pub poll_interval_secs: u64,
    /// Seconds to wait after a failed attempt before restarting the pipeline.
    pub retry_delay_secs: u64,
    /// Maximum pipeline runs per file.
    pub max_attempts: u32,
    /// Seconds to wait when a new file is still growing.
    pub settle_delay_secs: u64,
}

/// OCR engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Executable name or path of `ocrmypdf`.
    pub command: String,
    /// Default language hint passed with `-l`.
    pub language: String,
}

/// One bucket of the closed classification taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Language-model classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// API key, usually provided through `OPENAI_KEY`.
    pub api_key: String,
    /// Base URL of the chat completions API.
    pub base_url: String,
    pub model: String,
    /// Maximum number of OCR characters sent to the classifier.
    pub max_chars: usize,
    pub categories: Vec<Category>,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token, usually provided through `TELEGRAM_TOKEN`.
    pub token: Option<String>,
    pub api_url: String,
}

/// Destination layout shared by all storage backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Folder under which category folders are created.
    pub root: String,
}

/// Google OAuth client and consent server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client credentials as downloaded from the Google console.
    pub credentials_file: PathBuf,
    /// SQLite database holding refresh tokens.
    pub token_db: PathBuf,
    /// Listen address of the consent server.
    pub listen: String,
    /// Redirect URL registered with Google.
    pub redirect_url: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output style: `plain` or `json`.
    pub style: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, or return [`Config::default`] if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/scanfiler/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("scanfiler")
            .join("config.yaml")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.
    ///
    /// Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("OPENAI_KEY") {
            self.classifier.api_key = v;
        }
        if let Some(v) = get("TELEGRAM_TOKEN") {
            self.telegram.token = Some(v);
        }
        if let Some(v) = get("SCANFILER_FTP_HOST") {
            self.remote.host = v;
        }
        if let Some(v) = get("SCANFILER_FTP_USER") {
            self.remote.username = v;
        }
        if let Some(v) = get("SCANFILER_FTP_PASSWORD") {
            self.remote.password = v;
        }
    }

    /// Tenants configured in the `users` section.
    pub fn tenants(&self) -> TenantRegistry {
        TenantRegistry::new(self.users.clone())
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl RemoteConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 21,
            username: String::new(),
            password: String::new(),
            path: String::new(),
            connect_timeout_secs: 5,
            io_timeout_secs: 60,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            retry_delay_secs: 5,
            max_attempts: 5,
            settle_delay_secs: 10,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "ocrmypdf".to_string(),
            language: "deu".to_string(),
        }
    }
}

/// Name of the catch-all category that every taxonomy must contain.
pub const MISC_CATEGORY: &str = "misc";

/// Taxonomy used when the config file defines none.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("ids", "A scan of an ID card, passport, or similar card"),
        Category::new("exams", "A scan of an exam or similar"),
        Category::new("school", "A document that is related to school education"),
        Category::new("university", "A document that is related to university studies"),
        Category::new("bank", "A document that is related to a bank account"),
        Category::new("investments", "A document that is related to investments or a depot"),
        Category::new("taxes", "A document that is related to taxes"),
        Category::new("health", "A document that is related to health insurance or doctors"),
        Category::new("insurance", "A document that is related to any other insurance"),
        Category::new("gov", "A document that is issued by a government or other official institution"),
        Category::new("housing", "A document that is related to an apartment, rent, or utilities"),
        Category::new("work", "A document that is related to employment"),
        Category::new("travel", "A document that is related to public transport or travel"),
        Category::new(MISC_CATEGORY, "A document that does not fit into any of the above categories"),
    ]
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_chars: 2000,
            categories: default_categories(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "Documents/scans".to_string(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("creds.json"),
            token_db: PathBuf::from("tokens.db"),
            listen: "0.0.0.0:8080".to_string(),
            redirect_url: "http://localhost:8080/callback".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            style: "plain".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"watch.poll_interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.style`.
pub const VALID_LOG_STYLES: &[&str] = &["plain", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if self.remote.port == 0 {
            errors.push(ValidationError::new("remote.port", "must be greater than 0"));
        }
        if self.remote.connect_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "remote.connect_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.remote.io_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "remote.io_timeout_secs",
                "must be greater than 0",
            ));
        }

        // --- watch ---
        if self.watch.poll_interval_secs == 0 {
            errors.push(ValidationError::new(
                "watch.poll_interval_secs",
                "must be greater than 0",
            ));
        }
        if self.watch.max_attempts == 0 {
            errors.push(ValidationError::new(
                "watch.max_attempts",
                "must be greater than 0",
            ));
        }

        // --- ocr ---
        if self.ocr.command.trim().is_empty() {
            errors.push(ValidationError::new("ocr.command", "must not be empty"));
        }

        // --- classifier ---
        if self.classifier.max_chars == 0 {
            errors.push(ValidationError::new(
                "classifier.max_chars",
                "must be greater than 0",
            ));
        }
        if self.classifier.categories.is_empty() {
            errors.push(ValidationError::new(
                "classifier.categories",
                "must contain at least one category",
            ));
        } else if !self
            .classifier
            .categories
            .iter()
            .any(|c| c.name == MISC_CATEGORY)
        {
            errors.push(ValidationError::new(
                "classifier.categories",
                format!("must contain the catch-all category '{MISC_CATEGORY}'"),
            ));
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError::new(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }
        if !VALID_LOG_STYLES.contains(&self.logging.style.as_str()) {
            errors.push(ValidationError::new(
                "logging.style",
                format!(
                    "invalid style '{}'; valid options: {}",
                    self.logging.style,
                    VALID_LOG_STYLES.join(", ")
                ),
            ));
        }

        errors
    }

    /// Validate everything needed to run the watch loop.
    ///
    /// Includes [`Config::validate`] plus the FTP settings and the classifier
    /// API key.
    pub fn validate_daemon(&self) -> Vec<ValidationError> {
        let mut errors = self.validate();

        let required = [
            ("remote.host", &self.remote.host),
            ("remote.username", &self.remote.username),
            ("remote.password", &self.remote.password),
            ("remote.path", &self.remote.path),
            ("classifier.api_key", &self.classifier.api_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(field, "not set"));
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use scanfiler_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .remote_host("scanner.lan")
///     .remote_path("/scans")
///     .watch_poll_interval_secs(10)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.config.remote.host = host.into();
        self
    }

    pub fn remote_port(mut self, port: u16) -> Self {
        self.config.remote.port = port;
        self
    }

    pub fn remote_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.remote.username = username.into();
        self.config.remote.password = password.into();
        self
    }

    pub fn remote_path(mut self, path: impl Into<String>) -> Self {
        self.config.remote.path = path.into();
        self
    }

    // --- watch ---

    pub fn watch_poll_interval_secs(mut self, seconds: u64) -> Self {
        self.config.watch.poll_interval_secs = seconds;
        self
    }

    pub fn watch_retry_delay_secs(mut self, seconds: u64) -> Self {
        self.config.watch.retry_delay_secs = seconds;
        self
    }

    pub fn watch_max_attempts(mut self, n: u32) -> Self {
        self.config.watch.max_attempts = n;
        self
    }

    pub fn watch_settle_delay_secs(mut self, seconds: u64) -> Self {
        self.config.watch.settle_delay_secs = seconds;
        self
    }

    // --- classifier ---

    pub fn classifier_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.classifier.api_key = key.into();
        self
    }

    pub fn classifier_categories(mut self, categories: Vec<Category>) -> Self {
        self.config.classifier.categories = categories;
        self
    }

    // --- storage ---

    pub fn storage_root(mut self, root: impl Into<String>) -> Self {
        self.config.storage.root = root.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_style(mut self, style: impl Into<String>) -> Self {
        self.config.logging.style = style.into();
        self
    }

    // --- users ---

    pub fn user(mut self, folder: impl Into<String>, settings: TenantSettings) -> Self {
        self.config.users.insert(folder.into(), settings);
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
