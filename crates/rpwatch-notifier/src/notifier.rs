use async_trait::async_trait;

use crate::error::NotifierError;

/// Downstream channel the watcher reports to. The delivery target is bound
/// when the notifier is built.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, message: &str) -> Result<(), NotifierError>;

    /// Send a PNG image with a caption.
    async fn send_image(&self, image: &[u8], caption: &str) -> Result<(), NotifierError>;

    /// Forward a machine-readable event. No-op unless the channel has an
    /// event sink.
    async fn post_event(&self, payload: &serde_json::Value) -> Result<(), NotifierError> {
        let _ = payload;
        Ok(())
    }
}
