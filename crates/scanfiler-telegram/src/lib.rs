//! scanfiler Telegram - status messages through the Telegram Bot API
//!
//! Implements the [`INotifier`] port with `sendMessage` and HTML parse mode.
//! Recipients are numeric chat ids or user names; user names are sent as
//! `@name`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use scanfiler_core::config::TelegramConfig;
use scanfiler_core::ports::INotifier;

/// Base URL of the Telegram Bot API
const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Errors that can occur when sending a Telegram message
#[derive(Debug, Error)]
pub enum TelegramError {
    /// No bot token is configured
    #[error("Telegram bot token not set")]
    MissingToken,

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The Bot API rejected the message
    #[error("Telegram API returned {status}: {description}")]
    Api {
        status: StatusCode,
        description: String,
    },
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: Value,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Notifier sending HTML messages through a Telegram bot
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl TelegramNotifier {
    /// Creates a notifier for the bot identified by `token`
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_url(token, TELEGRAM_API_URL)
    }

    /// Creates a notifier with a custom API URL (useful for testing)
    pub fn with_api_url(token: Option<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Creates a notifier from the `telegram` config section
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self::with_api_url(config.token.clone(), &config.api_url)
    }

    /// Returns true if a bot token is configured
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Sends `html` to `recipient`
    pub async fn send(&self, recipient: &str, html: &str) -> Result<(), TelegramError> {
        let token = self.token.as_deref().ok_or(TelegramError::MissingToken)?;
        let body = SendMessage {
            chat_id: chat_id(recipient),
            text: html,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(format!("{}/bot{}/sendMessage", self.api_url, token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&text).ok();
        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                debug!(recipient, "Telegram message sent");
                Ok(())
            }
            Some(ApiResponse { description, .. }) => Err(TelegramError::Api {
                status,
                description: description.unwrap_or_default(),
            }),
            None => Err(TelegramError::Api {
                status,
                description: text,
            }),
        }
    }
}

/// Maps a configured recipient to a Bot API `chat_id`
fn chat_id(recipient: &str) -> Value {
    if let Ok(id) = recipient.parse::<i64>() {
        return Value::from(id);
    }
    if recipient.starts_with('@') {
        Value::from(recipient)
    } else {
        Value::from(format!("@{recipient}"))
    }
}

#[async_trait]
impl INotifier for TelegramNotifier {
    async fn notify(&self, recipient: &str, html: &str) -> anyhow::Result<()> {
        Ok(self.send(recipient, html).await?)
    }
}
