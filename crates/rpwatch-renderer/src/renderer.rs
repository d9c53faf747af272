use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::element::{ElementHandle, ElementSet};
use crate::error::RendererError;
use crate::locator::Locator;

/// Capability surface of a page renderer.
///
/// Every call is bounded: operations that can wait take an explicit timeout,
/// and the rest are bounded by the implementation's command timeout. An
/// elapsed bound surfaces as [`RendererError::Timeout`] (or an HTTP timeout),
/// never as a hang.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Load `url` and return once the document is interactive.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), RendererError>;

    /// Snapshot of the current matches for `locator`. Does not wait.
    async fn locate(&self, locator: &Locator) -> Result<ElementSet, RendererError>;

    /// Poll until the first match for `locator` is displayed.
    async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementSet, RendererError>;

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RendererError>;

    /// Rendered (visible) text of `element`.
    async fn text(&self, element: &ElementHandle) -> Result<String, RendererError>;

    async fn click(&self, element: &ElementHandle, timeout: Duration) -> Result<(), RendererError>;

    async fn scroll(&self, dx: i64, dy: i64) -> Result<(), RendererError>;

    /// PNG bytes of the page.
    async fn screenshot(&self) -> Result<Vec<u8>, RendererError>;

    async fn title(&self) -> Result<String, RendererError>;

    async fn current_url(&self) -> Result<String, RendererError>;

    /// Extra headers sent with every subsequent page request.
    async fn set_request_headers(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), RendererError>;
}
