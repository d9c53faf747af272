//! Reads the newest item's reference from the open repost tab.

use std::time::Duration;

use rpwatch_renderer::{Locator, Renderer, RendererError};

use crate::normalize::normalize_reference;
use crate::types::ExtractedItem;

/// Item locators, most specific first. The last tier also serves as the
/// "any card rendered yet" wait target.
pub const ITEM_LOCATOR_TIERS: [&str; 3] = [
    r#"[data-e2e="user-repost-item"] a[href*="/video/"]"#,
    r#"[data-e2e="user-post-item"] a[href*="/video/"]"#,
    r#"a[href*="/video/"]"#,
];

pub struct Extractor<'a, R: Renderer + ?Sized> {
    renderer: &'a R,
    origin: &'a str,
    tiers: Vec<Locator>,
    wait: Duration,
}

impl<'a, R: Renderer + ?Sized> Extractor<'a, R> {
    /// `wait` bounds how long to wait for any card when the first pass over
    /// the tiers finds nothing.
    pub fn new(renderer: &'a R, origin: &'a str, wait: Duration) -> Self {
        Self {
            renderer,
            origin,
            tiers: ITEM_LOCATOR_TIERS.iter().map(|s| Locator::css(*s)).collect(),
            wait,
        }
    }

    /// The first tier with a usable match wins; within it, the first element
    /// in document order that carries an `href`.
    ///
    /// # Errors
    ///
    /// Returns the [`RendererError`] from a lookup or attribute read. A wait
    /// that times out is not an error; it yields `Ok(None)`.
    pub async fn extract(&self) -> Result<Option<ExtractedItem>, RendererError> {
        if let Some(item) = self.scan().await? {
            return Ok(Some(item));
        }

        let Some(broadest) = self.tiers.last() else {
            return Ok(None);
        };
        match self.renderer.wait_visible(broadest, self.wait).await {
            Ok(_) => self.scan().await,
            Err(e) if e.is_timeout() => {
                tracing::debug!(wait_ms = ?self.wait, "no item cards rendered");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn scan(&self) -> Result<Option<ExtractedItem>, RendererError> {
        for (index, locator) in self.tiers.iter().enumerate() {
            let tier = index + 1;
            let set = self.renderer.locate(locator).await?;
            if set.is_empty() {
                tracing::trace!(tier, "tier has no matches");
                continue;
            }

            for element in set.iter() {
                let href = self.renderer.attribute(element, "href").await?;
                if let Some(reference) = href.and_then(|h| normalize_reference(&h, self.origin)) {
                    tracing::debug!(tier, matches = set.count(), %reference, "item extracted");
                    return Ok(Some(ExtractedItem {
                        canonical_reference: reference,
                        source_tier: tier,
                    }));
                }
            }
            tracing::debug!(tier, matches = set.count(), "tier matched but no element had an href");
        }
        Ok(None)
    }
}
