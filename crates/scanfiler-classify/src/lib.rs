//! scanfiler Classify - OCR and document classification
//!
//! Provides the two external collaborators between download and upload:
//! - [`OcrMyPdfExtractor`] runs `ocrmypdf` and reads back its text sidecar
//! - [`OpenAiClassifier`] asks a chat completions API to classify the text
//!
//! ## Modules
//!
//! - [`ocr`] - `ocrmypdf` process adapter
//! - [`openai`] - Chat completions client
//! - [`prompt`] - Classification instruction built from the taxonomy

pub mod ocr;
pub mod openai;
pub mod prompt;

use thiserror::Error;

pub use ocr::OcrMyPdfExtractor;
pub use openai::OpenAiClassifier;

/// Errors raised by the extraction and classification adapters
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The OCR command could not be started
    #[error("Cannot run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The OCR command exited unsuccessfully
    #[error("{command} failed with {status}: {stderr}")]
    OcrFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The OCR command succeeded but produced no text sidecar
    #[error("OCR produced no text artifact: {0}")]
    MissingArtifact(String),

    /// The classifier endpoint could not be reached
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The classifier endpoint returned an error status
    #[error("Classifier API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The classifier response had no choices
    #[error("Classifier returned no answer")]
    EmptyResponse,

    /// The answer was not a valid classification object
    #[error("Invalid classification JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
