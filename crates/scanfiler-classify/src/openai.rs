//! Chat completions classifier
//!
//! Sends the classification instruction and the OCR text as two user
//! messages to `POST {base_url}/chat/completions` and parses the first
//! choice as a [`Classification`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scanfiler_classify::OpenAiClassifier;
//! use scanfiler_core::config::default_categories;
//! use scanfiler_core::ports::IClassifier;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let classifier = OpenAiClassifier::new("sk-...", "gpt-4", &default_categories());
//! let classification = classifier.classify("Einkommensteuerbescheid 2023").await?;
//! println!("{} -> {}", classification.title, classification.category);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use scanfiler_core::config::{Category, ClassifierConfig};
use scanfiler_core::domain::Classification;
use scanfiler_core::ports::IClassifier;

use crate::prompt::{build_prompt, strip_code_fences};
use crate::ClassifyError;

/// Default base URL of the OpenAI API
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatAnswer,
}

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// OpenAiClassifier
// ============================================================================

/// Classifier backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt: String,
}

impl OpenAiClassifier {
    /// Creates a classifier against the public OpenAI API
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        categories: &[Category],
    ) -> Self {
        Self::with_base_url(api_key, model, categories, OPENAI_BASE_URL)
    }

    /// Creates a classifier with a custom base URL (useful for testing)
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        categories: &[Category],
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            prompt: build_prompt(categories),
        }
    }

    /// Creates a classifier from the `classifier` config section
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::with_base_url(
            &config.api_key,
            &config.model,
            &config.categories,
            &config.base_url,
        )
    }

    /// The instruction sent ahead of every document
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Classifies `text`
    ///
    /// # Errors
    ///
    /// Network failures, non-success statuses, empty answers and answers that
    /// do not parse into a [`Classification`].
    pub async fn request(&self, text: &str) -> Result<Classification, ClassifyError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "user",
                    content: &self.prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        debug!(model = %self.model, chars = text.chars().count(), "Requesting classification");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ClassifyError::EmptyResponse)?;

        let classification: Classification = serde_json::from_str(strip_code_fences(&content))?;
        info!(
            title = %classification.title,
            category = %classification.category,
            explanation = %classification.explanation,
            "Classification"
        );
        Ok(classification)
    }
}

#[async_trait]
impl IClassifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> anyhow::Result<Classification> {
        Ok(self.request(text).await?)
    }
}
