//! scanfiler Watch - change detection and document processing
//!
//! Drives newly observed remote files through
//! download → OCR → classify → upload → notify.
//!
//! ## Modules
//!
//! - [`watcher`] - [`WatchLoop`]: polling, diffing and per-tenant fan-out
//! - [`pipeline`] - [`FilePipeline`]: one file under the retry policy
//! - [`notify_queue`] - [`NotificationQueue`]: bounded fire-and-forget delivery
//! - [`messages`] - HTML status messages sent to tenants
//! - [`errors`] - Stage and loop errors

pub mod errors;
pub mod messages;
pub mod notify_queue;
pub mod pipeline;
pub mod watcher;

pub use errors::{StageError, WatchError};
pub use notify_queue::NotificationQueue;
pub use pipeline::{FileOutcome, FilePipeline, PipelinePorts, PipelineSettings};
pub use watcher::{TenantReport, TickReport, WatchLoop};

/// Joins a remote directory and an entry name with `/`
pub fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
