//! scanfiler FTP - remote folder access over FTP
//!
//! Implements the [`IRemoteListing`](scanfiler_core::ports::IRemoteListing)
//! and [`IFileTransfer`](scanfiler_core::ports::IFileTransfer) ports on top of
//! a single logged-in control connection.
//!
//! ## Modules
//!
//! - [`client`] - Connection handling and the port implementations
//! - [`listing`] - Parsing of `LIST` output into remote entries

pub mod client;
pub mod listing;

use thiserror::Error;

pub use client::FtpRemote;

/// Errors that can occur when talking to the FTP server
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The host name did not resolve to any address
    #[error("Cannot resolve {0}")]
    Resolve(String),

    /// The TCP connection could not be established
    #[error("Cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: suppaftp::FtpError,
    },

    /// The server rejected the credentials
    #[error("Login failed for {user}: {source}")]
    Login {
        user: String,
        #[source]
        source: suppaftp::FtpError,
    },

    /// A `LIST` command failed
    #[error("Cannot list {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: suppaftp::FtpError,
    },

    /// A `RETR` command failed
    #[error("Cannot download {path}: {source}")]
    Transfer {
        path: String,
        #[source]
        source: suppaftp::FtpError,
    },

    /// The blocking task running an FTP command panicked or was cancelled
    #[error("FTP task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The shared connection is unusable after a panic in another task
    #[error("FTP connection lock poisoned")]
    Poisoned,
}
