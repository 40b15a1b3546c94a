//! Classify command - OCR and classify a single local document
//!
//! Runs the same extraction and classification stages as the daemon, without
//! downloading or uploading anything.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use scanfiler_classify::{OcrMyPdfExtractor, OpenAiClassifier};
use scanfiler_core::config::Config;
use scanfiler_core::domain::{truncate_chars, Classification, ConfigError};

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// Path to the scanned document
    pub file: PathBuf,

    /// OCR language of the document (defaults to `ocr.language`)
    #[arg(short, long)]
    pub lang: Option<String>,
}

impl ClassifyCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if !self.file.is_file() {
            bail!("File not found: {}", self.file.display());
        }
        if config.classifier.api_key.is_empty() {
            return Err(ConfigError::MissingSetting("classifier.api_key".into()).into());
        }

        let language = self.lang.as_deref().unwrap_or(&config.ocr.language);
        info!(file = %self.file.display(), language, "Extracting text");

        let extractor = OcrMyPdfExtractor::from_config(&config.ocr);
        let text = extractor
            .run(&self.file, language)
            .await
            .context("Text extraction failed")?;
        if text.trim().is_empty() {
            formatter.warn("No text recognized, classifying an empty document");
        }

        let classifier = OpenAiClassifier::from_config(&config.classifier);
        let classification = classifier
            .request(truncate_chars(&text, config.classifier.max_chars))
            .await
            .context("Classification failed")?;

        print_classification(format, &self.file, &classification);
        Ok(())
    }
}

fn print_classification(format: OutputFormat, file: &std::path::Path, c: &Classification) {
    let formatter = get_formatter(format);
    match format {
        OutputFormat::Json => formatter.print_json(&serde_json::json!({
            "file": file.display().to_string(),
            "title": c.title,
            "category": c.category,
            "explanation": c.explanation,
            "filename": c.file_name,
        })),
        OutputFormat::Human => {
            formatter.success(&format!("Classified {}", file.display()));
            formatter.info(&format!("Title:       {}", c.title));
            formatter.info(&format!("Category:    {}", c.category));
            formatter.info(&format!("File name:   {}", c.file_name));
            formatter.info(&format!("Explanation: {}", c.explanation));
        }
    }
}
