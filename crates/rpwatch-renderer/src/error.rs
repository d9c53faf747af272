use thiserror::Error;

/// Errors surfaced by a [`crate::Renderer`] implementation.
#[derive(Debug, Error)]
pub enum RendererError {
    /// Network failure talking to the renderer runtime.
    #[error("HTTP error talking to renderer: {0}")]
    Http(#[from] reqwest::Error),

    /// The renderer accepted the request but the command failed.
    #[error("renderer command {command} failed ({error}): {message}")]
    Command {
        command: String,
        error: String,
        message: String,
    },

    /// A bounded wait elapsed.
    #[error("timed out after {after_ms} ms waiting for {what}")]
    Timeout { what: String, after_ms: u64 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("screenshot payload is not valid base64: {0}")]
    Screenshot(#[from] base64::DecodeError),

    #[error("invalid storage state: {0}")]
    StorageState(String),

    #[error("invalid renderer URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RendererError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// `true` when the referenced element vanished between lookup and use,
    /// which happens routinely while the page is still injecting content.
    #[must_use]
    pub fn is_stale_element(&self) -> bool {
        matches!(
            self,
            Self::Command { error, .. }
                if error == "stale element reference" || error == "no such element"
        )
    }
}
