//! Text extraction port

use std::path::Path;

use async_trait::async_trait;

/// Extracts plain text from a scanned document
///
/// Implementations run an external OCR engine. Any failed invocation (non-zero
/// exit, missing text artifact) is an error; the returned text is complete,
/// truncation is up to the caller.
#[async_trait]
pub trait ITextExtractor: Send + Sync {
    /// Extracts the text of `input` using the OCR language hint `language`
    async fn extract(&self, input: &Path, language: &str) -> anyhow::Result<String>;
}
