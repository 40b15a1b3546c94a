//! Polling watch loop
//!
//! Every tick lists the remote root, treats each folder as a tenant and scans
//! the tenants concurrently. Within one tenant, new files are processed one
//! after another.
//!
//! ## Change detection
//!
//! A [`KnownSet`] per tenant holds the file names seen at the end of the
//! previous tick. A file is new if its name is not in that set. The set is
//! handed to the tenant's task by value and a fresh one, rebuilt from the
//! listing, comes back when the task is done, so tenant tasks never share
//! state.
//!
//! The first tick only records a baseline: files that already exist when the
//! daemon starts are never processed. A tenant folder that shows up later
//! starts from an empty set, so all of its files are new.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use scanfiler_core::domain::{KnownSet, RemoteEntry, TenantRegistry};
use scanfiler_core::ports::IRemoteListing;

use crate::errors::WatchError;
use crate::pipeline::{FileOutcome, FilePipeline};
use crate::remote_join;

// ============================================================================
// Reports
// ============================================================================

/// What happened to one tenant folder during a tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantReport {
    /// Tenant folder name
    pub tenant: String,
    /// True if the folder was only recorded, not processed
    pub baseline: bool,
    /// New files found, in listing order
    pub new_files: Vec<String>,
    /// Files stored and announced
    pub delivered: Vec<String>,
    /// Files given up
    pub abandoned: Vec<String>,
    /// Listing error, if the folder could not be read
    pub listing_error: Option<String>,
}

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// One report per tenant folder, sorted by tenant name
    pub tenants: Vec<TenantReport>,
    /// Plain files found directly in the root, which are ignored
    pub ignored: Vec<String>,
}

impl TickReport {
    /// Report for `tenant`, if it was scanned
    pub fn tenant(&self, tenant: &str) -> Option<&TenantReport> {
        self.tenants.iter().find(|t| t.tenant == tenant)
    }

    /// Total number of new files across tenants
    pub fn new_files(&self) -> usize {
        self.tenants.iter().map(|t| t.new_files.len()).sum()
    }
}

// ============================================================================
// WatchLoop
// ============================================================================

/// Polls the remote root and feeds new files to the pipeline
pub struct WatchLoop {
    listing: Arc<dyn IRemoteListing>,
    pipeline: Arc<FilePipeline>,
    tenants: Arc<TenantRegistry>,
    root: String,
    poll_interval: Duration,
    known: HashMap<String, KnownSet>,
    /// Tenants whose known set was lost and must be re-recorded
    rebaseline: HashSet<String>,
    started: bool,
}

impl WatchLoop {
    /// Creates a loop watching `root`
    pub fn new(
        listing: Arc<dyn IRemoteListing>,
        pipeline: Arc<FilePipeline>,
        tenants: TenantRegistry,
        root: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            listing,
            pipeline,
            tenants: Arc::new(tenants),
            root: root.into(),
            poll_interval,
            known: HashMap::new(),
            rebaseline: HashSet::new(),
            started: false,
        }
    }

    /// Known set of `tenant`, if the folder has been listed
    pub fn known(&self, tenant: &str) -> Option<&KnownSet> {
        self.known.get(tenant)
    }

    /// Runs ticks until `shutdown` is cancelled
    ///
    /// Cancellation is honored between ticks; a tick in progress, including
    /// its retries, runs to completion.
    ///
    /// # Errors
    ///
    /// Returns the first [`WatchError`], which ends the loop.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), WatchError> {
        info!(
            root = %self.root,
            interval_secs = self.poll_interval.as_secs(),
            "Watching remote folder"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let report = self.tick().await?;
            if report.new_files() > 0 {
                info!(
                    tenants = report.tenants.len(),
                    new_files = report.new_files(),
                    "Tick completed"
                );
            } else {
                debug!(tenants = report.tenants.len(), "Tick completed");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Watch loop stopped");
        Ok(())
    }

    /// Runs one poll cycle
    ///
    /// # Errors
    ///
    /// [`WatchError::Listing`] if the root cannot be listed. Tenant folders
    /// that cannot be listed are reported in the [`TickReport`] and keep
    /// their previous known set.
    pub async fn tick(&mut self) -> Result<TickReport, WatchError> {
        let entries = self
            .listing
            .list(&self.root)
            .await
            .map_err(|error| WatchError::Listing {
                path: self.root.clone(),
                error,
            })?;

        let mut report = TickReport::default();
        let mut tasks = JoinSet::new();
        let mut spawned = Vec::new();

        for entry in entries {
            if !entry.is_folder() {
                warn!(name = %entry.name, "Ignoring file in remote root");
                report.ignored.push(entry.name);
                continue;
            }

            let baseline = !self.started || self.rebaseline.remove(&entry.name);
            let scan = TenantScan {
                listing: Arc::clone(&self.listing),
                pipeline: Arc::clone(&self.pipeline),
                tenants: Arc::clone(&self.tenants),
                path: remote_join(&self.root, &entry.name),
                known: self.known.remove(&entry.name).unwrap_or_default(),
                tenant: entry.name.clone(),
                baseline,
            };
            spawned.push(entry.name);
            tasks.spawn(scan.run());
        }

        // Known sets of tenant folders that disappeared are dropped here.
        let mut known = HashMap::with_capacity(spawned.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((tenant, set, tenant_report)) => {
                    // A folder never listed successfully has no baseline yet.
                    if tenant_report.baseline && tenant_report.listing_error.is_some() {
                        self.rebaseline.insert(tenant.clone());
                    }
                    known.insert(tenant, set);
                    report.tenants.push(tenant_report);
                }
                Err(e) => error!(error = %e, "Tenant task failed"),
            }
        }

        for tenant in spawned {
            if !known.contains_key(&tenant) {
                warn!(tenant = %tenant, "Known files lost, folder will be re-recorded");
                self.rebaseline.insert(tenant);
            }
        }

        self.known = known;
        self.started = true;
        report.tenants.sort_by(|a, b| a.tenant.cmp(&b.tenant));
        Ok(report)
    }
}

// ============================================================================
// TenantScan
// ============================================================================

/// Work item for one tenant folder during one tick
struct TenantScan {
    listing: Arc<dyn IRemoteListing>,
    pipeline: Arc<FilePipeline>,
    tenants: Arc<TenantRegistry>,
    tenant: String,
    path: String,
    known: KnownSet,
    baseline: bool,
}

impl TenantScan {
    async fn run(self) -> (String, KnownSet, TenantReport) {
        let mut report = TenantReport {
            tenant: self.tenant.clone(),
            baseline: self.baseline,
            ..Default::default()
        };

        let listing = match self.listing.list(&self.path).await {
            Ok(listing) => listing,
            Err(e) => {
                let message = format!("{e:#}");
                warn!(tenant = %self.tenant, path = %self.path, error = %message, "Cannot list tenant folder");
                report.listing_error = Some(message);
                return (self.tenant, self.known, report);
            }
        };

        if self.baseline {
            let known = KnownSet::from_listing(&listing);
            debug!(tenant = %self.tenant, files = known.len(), "Recorded existing files");
            return (self.tenant, known, report);
        }

        for entry in listing.iter().filter(|e| e.is_folder()) {
            debug!(tenant = %self.tenant, name = %entry.name, "Ignoring sub-folder");
        }

        let new_files: Vec<RemoteEntry> = self
            .known
            .new_files(&listing)
            .into_iter()
            .cloned()
            .collect();

        if !new_files.is_empty() {
            let tenant = self.tenants.get(&self.tenant);
            if !tenant.is_configured() {
                warn!(tenant = %self.tenant, "Folder has no matching user configuration");
            }

            for entry in &new_files {
                report.new_files.push(entry.name.clone());
                match self.pipeline.process(&tenant, &self.path, entry).await {
                    FileOutcome::Delivered { .. } => report.delivered.push(entry.name.clone()),
                    FileOutcome::Abandoned { .. } => report.abandoned.push(entry.name.clone()),
                }
            }
        }

        (self.tenant, KnownSet::from_listing(&listing), report)
    }
}
