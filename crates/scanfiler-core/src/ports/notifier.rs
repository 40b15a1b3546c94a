//! Notification port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - Messages are HTML fragments using the subset understood by Telegram
//!   (`<b>`, `<code>`, `<pre>`, `<blockquote>`, `<a>`).
//! - Delivery is fire-and-forget from the pipeline's point of view: callers
//!   log errors and move on. The trait still returns a `Result` so that the
//!   queue consuming messages can log the failure with context.

use async_trait::async_trait;

/// Delivers status messages to a tenant
#[async_trait]
pub trait INotifier: Send + Sync {
    /// Sends `html` to the notification identity `recipient`
    async fn notify(&self, recipient: &str, html: &str) -> anyhow::Result<()>;
}
