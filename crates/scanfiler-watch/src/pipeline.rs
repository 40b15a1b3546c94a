//! Per-file processing pipeline
//!
//! One new file is driven through download → OCR → classify → upload under a
//! bounded retry policy. Every attempt restarts from the download, in a fresh
//! scratch directory that is removed when the attempt ends.
//!
//! ## Retry policy
//!
//! - At most `max_attempts` runs per file, `retry_delay` apart.
//! - Every failure sends one message with the stage error and the number of
//!   tries left.
//! - Configuration errors (no usable storage backend) are permanent: the file
//!   is abandoned after the first failure.
//! - Exhausted files are not retried in later cycles.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use scanfiler_core::config::Config;
use scanfiler_core::domain::{truncate_chars, Classification, ProcessingAttempt, RemoteEntry, Tenant};
use scanfiler_core::ports::{
    IClassifier, IFileTransfer, IRemoteListing, ITextExtractor, StoredFile,
};
use scanfiler_core::usecases::StorageDispatcher;

use crate::errors::StageError;
use crate::messages;
use crate::notify_queue::NotificationQueue;
use crate::remote_join;

// ============================================================================
// Configuration
// ============================================================================

/// Ports the pipeline drives
#[derive(Clone)]
pub struct PipelinePorts {
    /// Used to re-check the size of a file before downloading it
    pub listing: Arc<dyn IRemoteListing>,
    pub transfer: Arc<dyn IFileTransfer>,
    pub extractor: Arc<dyn ITextExtractor>,
    pub classifier: Arc<dyn IClassifier>,
    pub dispatcher: Arc<StorageDispatcher>,
}

/// Tuning knobs of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// OCR language hint
    pub language: String,
    /// Characters of extracted text sent to the classifier
    pub max_chars: usize,
    /// Attempt budget per file
    pub max_attempts: u32,
    /// Pause between a failed attempt and the next one
    pub retry_delay: Duration,
    /// Pause before downloading a file whose size is still changing
    pub settle_delay: Duration,
}

impl PipelineSettings {
    /// Reads the pipeline settings from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.ocr.language.clone(),
            max_chars: config.classifier.max_chars,
            max_attempts: config.watch.max_attempts,
            retry_delay: config.watch.retry_delay(),
            settle_delay: config.watch.settle_delay(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ============================================================================
// FileOutcome
// ============================================================================

/// Final state of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Stored and announced to the tenant
    Delivered {
        classification: Classification,
        stored: StoredFile,
        attempts: u32,
    },
    /// Given up, either exhausted or permanently failed
    Abandoned { attempts: u32, last_error: String },
}

impl FileOutcome {
    /// Returns true if the file was delivered
    pub fn is_delivered(&self) -> bool {
        matches!(self, FileOutcome::Delivered { .. })
    }

    /// Number of attempts used
    pub fn attempts(&self) -> u32 {
        match self {
            FileOutcome::Delivered { attempts, .. } | FileOutcome::Abandoned { attempts, .. } => {
                *attempts
            }
        }
    }
}

// ============================================================================
// FilePipeline
// ============================================================================

/// Processes new files, one at a time per caller
pub struct FilePipeline {
    ports: PipelinePorts,
    notifications: NotificationQueue,
    settings: PipelineSettings,
}

impl FilePipeline {
    /// Creates a pipeline
    pub fn new(
        ports: PipelinePorts,
        notifications: NotificationQueue,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            ports,
            notifications,
            settings,
        }
    }

    /// Current settings
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Processes `entry`, a new file in the tenant folder `folder_path`
    ///
    /// Never fails: every error is reported to the tenant and reflected in
    /// the returned [`FileOutcome`].
    pub async fn process(&self, tenant: &Tenant, folder_path: &str, entry: &RemoteEntry) -> FileOutcome {
        let remote_path = remote_join(folder_path, &entry.name);
        info!(tenant = %tenant.name(), file = %entry.name, size = entry.size, "New file");
        self.notifications.send(tenant, messages::new_file(&entry.name));

        let mut attempt =
            ProcessingAttempt::new(&entry.name, entry.size, self.settings.max_attempts);

        while attempt.can_retry() {
            let number = attempt.begin();
            let span = info_span!(
                "attempt",
                id = %Uuid::new_v4(),
                tenant = %tenant.name(),
                file = %entry.name,
                attempt = number
            );

            let result = async {
                self.settle(folder_path, &mut attempt).await;
                self.run_once(tenant, &remote_path, &entry.name).await
            }
            .instrument(span)
            .await;

            match result {
                Ok((classification, stored)) => {
                    info!(
                        tenant = %tenant.name(),
                        file = %entry.name,
                        category = %classification.category,
                        locator = %stored.locator,
                        attempt = number,
                        "File delivered"
                    );
                    self.notifications.send(
                        tenant,
                        messages::delivered(&entry.name, &classification, &stored),
                    );
                    return FileOutcome::Delivered {
                        classification,
                        stored,
                        attempts: number,
                    };
                }
                Err(err) => {
                    attempt.record_failure(err.to_string());
                    let remaining = (!err.is_permanent()).then(|| attempt.remaining());
                    warn!(
                        tenant = %tenant.name(),
                        file = %entry.name,
                        stage = err.stage(),
                        attempt = number,
                        remaining = remaining.unwrap_or(0),
                        error = %err,
                        "Attempt failed"
                    );
                    self.notifications
                        .send(tenant, messages::failure(&entry.name, &err, remaining));

                    if err.is_permanent() {
                        break;
                    }
                    if attempt.can_retry() {
                        tokio::time::sleep(self.settings.retry_delay).await;
                    }
                }
            }
        }

        warn!(
            tenant = %tenant.name(),
            file = %entry.name,
            attempts = attempt.attempt(),
            "File abandoned"
        );
        FileOutcome::Abandoned {
            attempts: attempt.attempt(),
            last_error: attempt.last_error().unwrap_or_default().to_string(),
        }
    }

    /// Waits once if the remote size changed since it was last observed
    async fn settle(&self, folder_path: &str, attempt: &mut ProcessingAttempt) {
        let listing = match self.ports.listing.list(folder_path).await {
            Ok(listing) => listing,
            Err(e) => {
                debug!(error = format!("{e:#}"), "Size check failed");
                return;
            }
        };
        let Some(current) = listing
            .iter()
            .find(|e| e.is_file() && e.name == attempt.file())
        else {
            return;
        };
        let previous = attempt.observed_size();
        if attempt.observe_size(current.size) {
            debug!(
                previous,
                current = current.size,
                delay_ms = self.settings.settle_delay.as_millis() as u64,
                "File still growing, waiting"
            );
            tokio::time::sleep(self.settings.settle_delay).await;
        }
    }

    /// One full run of the pipeline
    async fn run_once(
        &self,
        tenant: &Tenant,
        remote_path: &str,
        file_name: &str,
    ) -> Result<(Classification, StoredFile), StageError> {
        let scratch = tempfile::Builder::new()
            .prefix("scanfiler-")
            .tempdir()
            .map_err(|e| StageError::Download(e.into()))?;
        let local = scratch_path(scratch.path(), file_name);

        self.ports
            .transfer
            .download(remote_path, &local)
            .await
            .map_err(StageError::Download)?;
        debug!(path = %local.display(), "Downloaded");

        let text = self
            .ports
            .extractor
            .extract(&local, &self.settings.language)
            .await
            .map_err(StageError::Extract)?;
        let text = truncate_chars(&text, self.settings.max_chars);
        debug!(chars = text.chars().count(), "Text extracted");

        let classification = self
            .ports
            .classifier
            .classify(text)
            .await
            .map_err(StageError::Classify)?;
        debug!(category = %classification.category, title = %classification.title, "Classified");

        let data = tokio::fs::read(&local)
            .await
            .map_err(|e| StageError::Upload(e.into()))?;
        let stored = self
            .ports
            .dispatcher
            .dispatch(tenant, &classification, &data)
            .await?;

        Ok((classification, stored))
    }
}

/// Local file name for a download, stripped of any directory component
fn scratch_path(dir: &Path, file_name: &str) -> PathBuf {
    let name = Path::new(file_name)
        .file_name()
        .filter(|n| !n.is_empty())
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "document".into());
    dir.join(name)
}
