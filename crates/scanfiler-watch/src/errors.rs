//! Error types for the watch loop and the per-file pipeline

use thiserror::Error;

use scanfiler_core::domain::ConfigError;
use scanfiler_core::usecases::DispatchError;

/// Failure of one pipeline stage for one attempt
///
/// The `Display` text is what the tenant sees in the failure message.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Error downloading file: {0:#}")]
    Download(anyhow::Error),

    #[error("Error extracting text: {0:#}")]
    Extract(anyhow::Error),

    #[error("Error classifying file: {0:#}")]
    Classify(anyhow::Error),

    #[error("Error uploading file: {0:#}")]
    Upload(anyhow::Error),

    /// The tenant's storage configuration is unusable; retrying cannot help
    #[error("Configuration error: {0}")]
    Configuration(ConfigError),
}

impl StageError {
    /// Short stage name for logs
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Download(_) => "download",
            StageError::Extract(_) => "extract",
            StageError::Classify(_) => "classify",
            StageError::Upload(_) => "upload",
            StageError::Configuration(_) => "configuration",
        }
    }

    /// Human-readable headline, without the error detail
    pub fn headline(&self) -> &'static str {
        match self {
            StageError::Download(_) => "Error downloading file",
            StageError::Extract(_) => "Error extracting text",
            StageError::Classify(_) => "Error classifying file",
            StageError::Upload(_) => "Error uploading file",
            StageError::Configuration(_) => "Configuration error",
        }
    }

    /// The underlying error message
    pub fn detail(&self) -> String {
        match self {
            StageError::Download(e)
            | StageError::Extract(e)
            | StageError::Classify(e)
            | StageError::Upload(e) => format!("{e:#}"),
            StageError::Configuration(e) => e.to_string(),
        }
    }

    /// Returns true if the file must not be retried
    pub fn is_permanent(&self) -> bool {
        matches!(self, StageError::Configuration(_))
    }
}

impl From<DispatchError> for StageError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Config(e) => StageError::Configuration(e),
            DispatchError::Backend(e) => StageError::Upload(e),
        }
    }
}

/// Fatal errors that stop the watch loop
#[derive(Debug, Error)]
pub enum WatchError {
    /// The remote root could not be listed, usually a lost connection
    #[error("Cannot list remote root {path}: {error:#}")]
    Listing { path: String, error: anyhow::Error },
}
