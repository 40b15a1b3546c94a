//! Daemon mode - watch the FTP drop folders until interrupted
//!
//! Validates the configuration, connects to the FTP server, wires the
//! adapters into the pipeline and runs the [`WatchLoop`] until SIGINT or
//! SIGTERM. When Google OAuth client credentials are readable the consent
//! server runs alongside.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use scanfiler_classify::{OcrMyPdfExtractor, OpenAiClassifier};
use scanfiler_core::config::{Config, GoogleConfig};
use scanfiler_core::domain::{Destination, GoogleDriveSettings, Tenant};
use scanfiler_core::ports::{IStorageBackend, StoredFile};
use scanfiler_core::usecases::StorageDispatcher;
use scanfiler_ftp::FtpRemote;
use scanfiler_storage::{
    ConsentServer, GoogleDriveBackend, GoogleOAuth, NextcloudBackend, SqliteTokenStore,
};
use scanfiler_telegram::TelegramNotifier;
use scanfiler_watch::notify_queue::DEFAULT_CAPACITY;
use scanfiler_watch::{FilePipeline, NotificationQueue, PipelinePorts, PipelineSettings, WatchLoop};

/// Time allowed for queued notifications to go out on shutdown
const NOTIFY_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct DaemonCommand;

impl DaemonCommand {
    pub async fn execute(&self, config: Config) -> Result<()> {
        info!("scanfiler daemon starting");

        let problems = config.validate_daemon();
        if !problems.is_empty() {
            for problem in &problems {
                error!(field = %problem.field, "{}", problem.message);
            }
            bail!(
                "Invalid configuration: {}",
                problems
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }

        let tenants = config.tenants();
        if tenants.is_empty() {
            warn!("No users configured, every folder will be rejected at upload");
        }
        for problem in tenants.storage_problems() {
            warn!(error = %problem, "User storage misconfigured");
        }

        let notifier = TelegramNotifier::from_config(&config.telegram);
        if !notifier.has_token() {
            warn!("No Telegram token configured, notifications will fail");
        }

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal(signal_token).await;
        });

        let remote = Arc::new(
            FtpRemote::connect(&config.remote)
                .await
                .context("Cannot connect to FTP server")?,
        );
        info!(host = %config.remote.host, path = %config.remote.path, "Connected to FTP server");

        let (drive, consent): (Arc<dyn IStorageBackend<GoogleDriveSettings>>, _) =
            match google_drive(&config.google, shutdown.clone()).await {
                Ok((backend, handle)) => (backend, Some(handle)),
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(error = %reason, "Google Drive unavailable");
                    let backend: Arc<dyn IStorageBackend<GoogleDriveSettings>> =
                        Arc::new(UnavailableDrive { reason });
                    (backend, None)
                }
            };

        let dispatcher = Arc::new(StorageDispatcher::new(
            config.storage.root.clone(),
            Arc::new(NextcloudBackend::new()),
            drive,
        ));
        let (queue, notify_task) = NotificationQueue::spawn(Arc::new(notifier), DEFAULT_CAPACITY);
        let pipeline = Arc::new(FilePipeline::new(
            PipelinePorts {
                listing: remote.clone(),
                transfer: remote.clone(),
                extractor: Arc::new(OcrMyPdfExtractor::from_config(&config.ocr)),
                classifier: Arc::new(OpenAiClassifier::from_config(&config.classifier)),
                dispatcher,
            },
            queue,
            PipelineSettings::from_config(&config),
        ));

        let mut watch = WatchLoop::new(
            remote.clone(),
            pipeline,
            tenants,
            config.remote.path.clone(),
            config.watch.poll_interval(),
        );
        let result = watch.run(shutdown.clone()).await;

        // Stop the consent server and flush notifications
        shutdown.cancel();
        drop(watch);
        if tokio::time::timeout(NOTIFY_DRAIN_TIMEOUT, notify_task)
            .await
            .is_err()
        {
            warn!("Pending notifications dropped on shutdown");
        }
        if let Some(handle) = consent {
            if let Err(e) = handle.await {
                error!(error = %e, "Consent server task failed");
            }
        }
        remote.quit().await;

        result.context("Watch loop failed")?;
        info!("scanfiler daemon stopped");
        Ok(())
    }
}

/// Builds the Drive backend and spawns the consent server
async fn google_drive(
    config: &GoogleConfig,
    shutdown: CancellationToken,
) -> Result<(Arc<dyn IStorageBackend<GoogleDriveSettings>>, JoinHandle<()>)> {
    let oauth = Arc::new(
        GoogleOAuth::from_file(&config.credentials_file, &config.redirect_url).with_context(
            || format!("Cannot read Google credentials {}", config.credentials_file.display()),
        )?,
    );
    let tokens = SqliteTokenStore::open(&config.token_db)
        .await
        .with_context(|| format!("Cannot open token store {}", config.token_db.display()))?;

    let server = ConsentServer::new(oauth.clone(), tokens.clone());
    let listen = config.listen.clone();
    let handle = tokio::spawn(async move {
        if let Err(e) = server.run(&listen, shutdown).await {
            error!(addr = %listen, error = format!("{e:#}"), "Consent server failed");
        }
    });

    Ok((Arc::new(GoogleDriveBackend::new(oauth, tokens)), handle))
}

/// Stand-in used when Google credentials are missing
///
/// Uploads for Drive users fail with the setup error and are retried like
/// any other upload failure.
struct UnavailableDrive {
    reason: String,
}

#[async_trait]
impl IStorageBackend<GoogleDriveSettings> for UnavailableDrive {
    fn provider_name(&self) -> &'static str {
        "Google Drive"
    }

    async fn store(
        &self,
        _tenant: &Tenant,
        _settings: &GoogleDriveSettings,
        _destination: &Destination,
        _data: &[u8],
    ) -> anyhow::Result<StoredFile> {
        bail!("Google Drive is not configured: {}", self.reason)
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
