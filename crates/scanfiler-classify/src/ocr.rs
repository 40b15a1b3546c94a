//! OcrMyPdfExtractor - text extraction through the `ocrmypdf` command
//!
//! Runs `<command> <input> <out.pdf> --redo-ocr -l <lang> --sidecar <out.txt>`
//! in a private temporary directory and returns the sidecar contents. The
//! directory is removed when the call returns, whatever the outcome.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use scanfiler_core::config::OcrConfig;
use scanfiler_core::ports::ITextExtractor;

use crate::ClassifyError;

/// Text extractor backed by `ocrmypdf`
#[derive(Debug, Clone)]
pub struct OcrMyPdfExtractor {
    command: PathBuf,
}

impl OcrMyPdfExtractor {
    /// Creates an extractor invoking `command`
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Creates an extractor from the `ocr` config section
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(&config.command)
    }

    /// Runs the OCR command and returns the extracted text
    pub async fn run(&self, input: &Path, language: &str) -> Result<String, ClassifyError> {
        let command = self.command.display().to_string();
        let scratch = tempfile::Builder::new()
            .prefix("scanfiler-ocr-")
            .tempdir()
            .map_err(|source| ClassifyError::Spawn {
                command: command.clone(),
                source,
            })?;
        let output_pdf = scratch.path().join("output.pdf");
        let sidecar = scratch.path().join("output.txt");

        debug!(command = %command, input = %input.display(), language, "Running OCR");
        let output = Command::new(&self.command)
            .arg(input)
            .arg(&output_pdf)
            .arg("--redo-ocr")
            .arg("-l")
            .arg(language)
            .arg("--sidecar")
            .arg(&sidecar)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ClassifyError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(command = %command, status = %output.status, "OCR command failed");
            return Err(ClassifyError::OcrFailed {
                command,
                status: output.status,
                stderr,
            });
        }

        match tokio::fs::read(&sidecar).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                debug!(chars = text.chars().count(), "OCR text extracted");
                Ok(text)
            }
            Err(err) => Err(ClassifyError::MissingArtifact(format!(
                "{}: {err}",
                sidecar.display()
            ))),
        }
    }
}

#[async_trait]
impl ITextExtractor for OcrMyPdfExtractor {
    async fn extract(&self, input: &Path, language: &str) -> anyhow::Result<String> {
        Ok(self.run(input, language).await?)
    }
}
