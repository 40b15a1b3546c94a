//! FtpRemote - remote listing and transfer over one FTP control connection
//!
//! ## Design Notes
//!
//! - `suppaftp::FtpStream` is blocking, so every command runs inside
//!   `tokio::task::spawn_blocking`.
//! - The stream sits behind a `std::sync::Mutex`: FTP allows one command at a
//!   time per control connection, so concurrent tenant tasks are serialized
//!   here.
//! - The connection is established once. Losing it surfaces as listing
//!   errors; there is no reconnect.
//! - Reads and writes on the control socket time out, so a stalled server
//!   fails the command instead of holding the lock forever.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tracing::{debug, info};

use scanfiler_core::config::RemoteConfig;
use scanfiler_core::domain::RemoteEntry;
use scanfiler_core::ports::{IFileTransfer, IRemoteListing};

use crate::listing::parse_listing;
use crate::RemoteError;

/// A logged-in FTP session implementing the remote ports
#[derive(Clone)]
pub struct FtpRemote {
    stream: Arc<Mutex<FtpStream>>,
}

impl FtpRemote {
    /// Connects and logs in using the `remote` config section
    pub async fn connect(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::connect_with(
            &config.host,
            config.port,
            &config.username,
            &config.password,
            config.connect_timeout(),
            config.io_timeout(),
        )
        .await
    }

    /// Connects to `host:port`, logs in and switches to binary mode
    ///
    /// # Errors
    ///
    /// Resolution, connection and login failures. All are fatal for the
    /// watch loop.
    pub async fn connect_with(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let target = format!("{host}:{port}");
        let user = user.to_string();
        let password = password.to_string();

        let stream = tokio::task::spawn_blocking(move || -> Result<FtpStream, RemoteError> {
            let addr = resolve(&target)?;
            let connect_error = |source| RemoteError::Connect {
                addr: target.clone(),
                source,
            };
            let tcp = open_control_socket(addr, connect_timeout, io_timeout)
                .map_err(|e| connect_error(FtpError::ConnectionError(e)))?;
            let mut stream = FtpStream::connect_with_stream(tcp).map_err(connect_error)?;
            stream
                .login(&user, &password)
                .map_err(|source| RemoteError::Login {
                    user: user.clone(),
                    source,
                })?;
            stream
                .transfer_type(FileType::Binary)
                .map_err(|source| RemoteError::Connect {
                    addr: target.clone(),
                    source,
                })?;
            info!(server = %target, user = %user, "Connected to FTP server");
            Ok(stream)
        })
        .await??;

        Ok(Self {
            stream: Arc::new(Mutex::new(stream)),
        })
    }

    /// Runs `op` on the control connection in a blocking task
    async fn with_stream<T, F>(&self, op: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T, RemoteError> + Send + 'static,
    {
        let stream = Arc::clone(&self.stream);
        tokio::task::spawn_blocking(move || {
            let mut guard = stream.lock().map_err(|_| RemoteError::Poisoned)?;
            op(&mut guard)
        })
        .await?
    }

    /// Sends `QUIT`; errors are ignored
    pub async fn quit(&self) {
        let _ = self
            .with_stream(|s| {
                let _ = s.quit();
                Ok(())
            })
            .await;
    }
}

/// Connects the control socket with read and write timeouts applied
///
/// The timeouts are set before the server greeting is read.
fn open_control_socket(
    addr: SocketAddr,
    connect_timeout: Duration,
    io_timeout: Duration,
) -> std::io::Result<TcpStream> {
    let tcp = TcpStream::connect_timeout(&addr, connect_timeout)?;
    tcp.set_read_timeout(Some(io_timeout))?;
    tcp.set_write_timeout(Some(io_timeout))?;
    Ok(tcp)
}

fn resolve(target: &str) -> Result<SocketAddr, RemoteError> {
    target
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| RemoteError::Resolve(target.to_string()))
}

#[async_trait]
impl IRemoteListing for FtpRemote {
    async fn list(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let owned = path.to_string();
        let lines = self
            .with_stream(move |s| {
                let dir = (!owned.is_empty()).then_some(owned.as_str());
                s.list(dir)
                    .map_err(|source| RemoteError::Listing { path: owned, source })
            })
            .await?;

        let entries = parse_listing(&lines);
        debug!(path, entries = entries.len(), "Listed remote directory");
        Ok(entries)
    }
}

#[async_trait]
impl IFileTransfer for FtpRemote {
    async fn download(&self, remote_path: &str, dest: &Path) -> anyhow::Result<()> {
        let owned = remote_path.to_string();
        let data = self
            .with_stream(move |s| {
                s.retr_as_buffer(&owned)
                    .map(|cursor| cursor.into_inner())
                    .map_err(|source| RemoteError::Transfer { path: owned, source })
            })
            .await?;

        tokio::fs::write(dest, &data)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        debug!(remote_path, bytes = data.len(), "Downloaded remote file");
        Ok(())
    }
}
