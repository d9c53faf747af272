use thiserror::Error;

/// Errors returned by a [`crate::Notifier`].
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Network or TLS failure. URLs are stripped so bot tokens never reach logs.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered `"ok": false`.
    #[error("Telegram {method} rejected: {description}")]
    Api { method: String, description: String },

    #[error("rate limited by {service} (retry after {retry_after_secs}s)")]
    RateLimited {
        service: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {target}")]
    UnexpectedStatus { status: u16, target: String },

    #[error("invalid notifier URL: {0}")]
    InvalidUrl(String),
}
