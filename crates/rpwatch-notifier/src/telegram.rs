//! Telegram Bot API delivery with an optional JSON webhook sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::NotifierError;
use crate::event::truncate_chars;
use crate::notifier::Notifier;
use crate::retry::retry_with_backoff;

const DEFAULT_API_BASE: &str = "https://api.telegram.org/";

/// Bot API limits, in characters.
const MESSAGE_LIMIT: usize = 4096;
const CAPTION_LIMIT: usize = 1024;

const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// Sends alerts to one Telegram chat.
///
/// Use [`TelegramNotifier::new`] for the real Bot API or
/// [`TelegramNotifier::with_base_url`] to point at a mock server in tests.
pub struct TelegramNotifier {
    client: Client,
    api_base: Url,
    token: String,
    chat_id: String,
    webhook_url: Option<Url>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`NotifierError::Http`] if the HTTP client cannot be built.
    pub fn new(token: &str, chat_id: &str, timeout_secs: u64) -> Result<Self, NotifierError> {
        Self::with_base_url(token, chat_id, timeout_secs, DEFAULT_API_BASE)
    }

    /// # Errors
    ///
    /// - [`NotifierError::Http`] if the HTTP client cannot be built.
    /// - [`NotifierError::InvalidUrl`] if `api_base` is not a valid URL.
    pub fn with_base_url(
        token: &str,
        chat_id: &str,
        timeout_secs: u64,
        api_base: &str,
    ) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rpwatch/0.1")
            .build()
            .map_err(|e| NotifierError::Http(e.without_url()))?;

        let normalised = format!("{}/", api_base.trim_end_matches('/'));
        let api_base = Url::parse(&normalised)
            .map_err(|e| NotifierError::InvalidUrl(format!("telegram base '{api_base}': {e}")))?;

        Ok(Self {
            client,
            api_base,
            token: token.to_owned(),
            chat_id: chat_id.to_owned(),
            webhook_url: None,
            max_retries: 2,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Also forward [`Notifier::post_event`] payloads to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::InvalidUrl`] if `url` does not parse.
    pub fn with_webhook(mut self, url: &str) -> Result<Self, NotifierError> {
        let parsed =
            Url::parse(url).map_err(|e| NotifierError::InvalidUrl(format!("webhook: {e}")))?;
        self.webhook_url = Some(parsed);
        Ok(self)
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn has_webhook(&self) -> bool {
        self.webhook_url.is_some()
    }

    fn method_url(&self, method: &str) -> Result<Url, NotifierError> {
        // Built as a full string: `bot123:abc` would parse as a URL scheme if
        // passed to `Url::join`.
        Url::parse(&format!("{}bot{}/{method}", self.api_base, self.token))
            .map_err(|_| NotifierError::InvalidUrl(format!("telegram method {method}")))
    }

    async fn send_message_once(&self, url: Url, text: &str) -> Result<(), NotifierError> {
        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": false,
        });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifierError::Http(e.without_url()))?;
        check_response("sendMessage", response).await
    }

    async fn send_photo_once(
        &self,
        url: Url,
        image: &[u8],
        caption: &str,
    ) -> Result<(), NotifierError> {
        let photo = Part::bytes(image.to_vec())
            .file_name("diagnostic.png")
            .mime_str("image/png")
            .map_err(|e| NotifierError::Http(e.without_url()))?;
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_owned())
            .part("photo", photo);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotifierError::Http(e.without_url()))?;
        check_response("sendPhoto", response).await
    }

    async fn post_webhook_once(
        &self,
        url: &Url,
        payload: &serde_json::Value,
    ) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifierError::Http(e.without_url()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifierError::UnexpectedStatus {
                status: status.as_u16(),
                target: "webhook".to_owned(),
            })
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, message: &str) -> Result<(), NotifierError> {
        let url = self.method_url("sendMessage")?;
        let text = truncate_chars(message, MESSAGE_LIMIT);
        retry_with_backoff("sendMessage", self.max_retries, self.backoff_base_ms, || {
            self.send_message_once(url.clone(), &text)
        })
        .await?;
        tracing::debug!(chars = text.chars().count(), "telegram message sent");
        Ok(())
    }

    async fn send_image(&self, image: &[u8], caption: &str) -> Result<(), NotifierError> {
        let url = self.method_url("sendPhoto")?;
        let caption = truncate_chars(caption, CAPTION_LIMIT);
        retry_with_backoff("sendPhoto", self.max_retries, self.backoff_base_ms, || {
            self.send_photo_once(url.clone(), image, &caption)
        })
        .await?;
        tracing::debug!(bytes = image.len(), "telegram photo sent");
        Ok(())
    }

    async fn post_event(&self, payload: &serde_json::Value) -> Result<(), NotifierError> {
        let Some(url) = self.webhook_url.as_ref() else {
            return Ok(());
        };
        retry_with_backoff("webhook", self.max_retries, self.backoff_base_ms, || {
            self.post_webhook_once(url, payload)
        })
        .await?;
        tracing::debug!("webhook event posted");
        Ok(())
    }
}

async fn check_response(method: &str, response: reqwest::Response) -> Result<(), NotifierError> {
    let status = response.status();
    let body: Option<BotResponse> = response.json().await.ok();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = body
            .as_ref()
            .and_then(|b| b.parameters.as_ref())
            .and_then(|p| p.retry_after)
            .unwrap_or(1);
        return Err(NotifierError::RateLimited {
            service: "telegram".to_owned(),
            retry_after_secs,
        });
    }

    match body {
        Some(b) if b.ok => Ok(()),
        Some(b) if !status.is_server_error() => Err(NotifierError::Api {
            method: method.to_owned(),
            description: b
                .description
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        }),
        _ => Err(NotifierError::UnexpectedStatus {
            status: status.as_u16(),
            target: format!("telegram {method}"),
        }),
    }
}
