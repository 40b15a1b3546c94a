//! Classification port

use async_trait::async_trait;

use crate::domain::Classification;

/// Classifies document text into the configured taxonomy
///
/// Transport errors and unparseable answers are both plain errors; the
/// pipeline treats them the same way.
#[async_trait]
pub trait IClassifier: Send + Sync {
    /// Classifies `text`, which is already truncated to the character budget
    async fn classify(&self, text: &str) -> anyhow::Result<Classification>;
}
