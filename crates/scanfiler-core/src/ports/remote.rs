//! Remote folder ports (driven/secondary ports)
//!
//! The remote tree is a root directory containing one folder per tenant.
//! Listing and downloading are split into two traits so that the watch loop
//! can be tested with independent fakes, although a single adapter usually
//! implements both.
//!
//! Both traits use `anyhow::Result`: failures are adapter-specific (socket
//! errors, FTP reply codes) and only ever reported, never matched on.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::RemoteEntry;

/// Lists remote directories
#[async_trait]
pub trait IRemoteListing: Send + Sync {
    /// Lists the direct children of `path`
    ///
    /// Entries `.` and `..` are never returned.
    async fn list(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>>;
}

/// Downloads remote files
#[async_trait]
pub trait IFileTransfer: Send + Sync {
    /// Downloads `remote_path` into the local file `dest`, replacing it
    async fn download(&self, remote_path: &str, dest: &Path) -> anyhow::Result<()>;
}
