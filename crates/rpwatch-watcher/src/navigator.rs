//! Brings the renderer from "nothing loaded" to "repost cards on screen".
//!
//! Every step is bounded: one navigation, one visibility wait, a fixed
//! number of tab heuristics and scroll steps. Failures that describe the page
//! (block screen, missing tab) come back as [`Navigation`] variants; only
//! renderer faults are errors.

use std::time::Duration;

use rpwatch_core::WatchConfig;
use rpwatch_renderer::{Locator, Renderer, RendererError};

use crate::types::{TabAttempt, TabAttemptResult, TabHeuristic, TabSelection};

const TAB_LIST_ITEMS: &str = r#"[role="tablist"] [role="tab"]"#;
const LATEST_ITEM: &str = r#"a[href*="/video/"]"#;

/// 0-based tab positions tried when no label matches. The repost tab sits
/// right after the videos tab on current layouts.
const DEFAULT_TAB_POSITIONS: [usize; 2] = [1, 2];

/// Pixels per scroll step.
const SCROLL_STEP_PX: i64 = 600;

#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    pub page_load_timeout: Duration,
    pub element_timeout: Duration,
    pub nav_settle: Duration,
    pub tab_settle: Duration,
    pub scroll_steps: u32,
    pub scroll_settle: Duration,
    pub tab_labels: Vec<String>,
    pub tab_positions: Vec<usize>,
    pub block_keywords: Vec<String>,
}

impl NavigatorSettings {
    #[must_use]
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
            nav_settle: Duration::from_millis(config.nav_settle_ms),
            tab_settle: Duration::from_millis(config.tab_settle_ms),
            scroll_steps: config.scroll_steps,
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
            tab_labels: config.tab_labels.clone(),
            tab_positions: DEFAULT_TAB_POSITIONS.to_vec(),
            block_keywords: config.block_keywords.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Repost tab is open and the feed has been scrolled.
    Ready(TabSelection),
    Blocked { matched_keywords: Vec<String> },
    TabNotFound(TabSelection),
}

pub struct Navigator<'a, R: Renderer + ?Sized> {
    renderer: &'a R,
    settings: &'a NavigatorSettings,
}

impl<'a, R: Renderer + ?Sized> Navigator<'a, R> {
    pub fn new(renderer: &'a R, settings: &'a NavigatorSettings) -> Self {
        Self { renderer, settings }
    }

    /// Loads `profile_url` and opens the repost tab.
    ///
    /// # Errors
    ///
    /// Returns the [`RendererError`] from navigation, the `body` visibility
    /// wait, reading the page text, or scrolling. Tab lookup failures are reported as
    /// [`Navigation::TabNotFound`] instead.
    pub async fn open_profile(&self, profile_url: &str) -> Result<Navigation, RendererError> {
        self.renderer
            .navigate(profile_url, self.settings.page_load_timeout)
            .await?;
        self.renderer
            .wait_visible(&Locator::css("body"), self.settings.element_timeout)
            .await?;
        tokio::time::sleep(self.settings.nav_settle).await;

        let page_text = page_text(self.renderer).await?;
        let matched_keywords = match_block_keywords(&page_text, &self.settings.block_keywords);
        if !matched_keywords.is_empty() {
            tracing::warn!(keywords = ?matched_keywords, "block page detected");
            return Ok(Navigation::Blocked { matched_keywords });
        }

        let selection = self.select_tab().await;
        if selection.selected().is_none() {
            tracing::warn!(attempts = %selection.summary(), "repost tab not found");
            return Ok(Navigation::TabNotFound(selection));
        }
        tracing::debug!(attempts = %selection.summary(), "repost tab opened");

        self.scroll_feed().await?;
        Ok(Navigation::Ready(selection))
    }

    /// Tries visible text, then accessibility role, for every label, then
    /// positional candidates in the tab list. Stops at the first click that
    /// succeeds. Never fails: each attempt's outcome is recorded.
    pub async fn select_tab(&self) -> TabSelection {
        let mut selection = TabSelection::default();

        for heuristic in [TabHeuristic::VisibleText, TabHeuristic::Role] {
            for label in &self.settings.tab_labels {
                let locator = match heuristic {
                    TabHeuristic::VisibleText => Locator::visible_text(label),
                    _ => Locator::role("tab", label),
                };
                let result = self.try_click(&locator, 0).await;
                let clicked = result == TabAttemptResult::Clicked;
                selection.attempts.push(TabAttempt {
                    heuristic,
                    target: label.clone(),
                    result,
                });
                if clicked {
                    tokio::time::sleep(self.settings.tab_settle).await;
                    return selection;
                }
            }
        }

        let tab_list = Locator::css(TAB_LIST_ITEMS);
        for &index in &self.settings.tab_positions {
            let result = self.try_click(&tab_list, index).await;
            let clicked = result == TabAttemptResult::Clicked;
            selection.attempts.push(TabAttempt {
                heuristic: TabHeuristic::Position,
                target: format!("#{index}"),
                result,
            });
            if clicked {
                tokio::time::sleep(self.settings.tab_settle).await;
                return selection;
            }
        }

        selection
    }

    async fn try_click(&self, locator: &Locator, index: usize) -> TabAttemptResult {
        let set = match self.renderer.locate(locator).await {
            Ok(set) => set,
            Err(e) => {
                tracing::debug!(%locator, error = %e, "tab lookup failed");
                return TabAttemptResult::NotFound;
            }
        };
        let Some(element) = set.get(index) else {
            return TabAttemptResult::NotFound;
        };
        match self
            .renderer
            .click(element, self.settings.element_timeout)
            .await
        {
            Ok(()) => TabAttemptResult::Clicked,
            Err(e) => {
                tracing::debug!(%locator, index, error = %e, "tab click failed");
                TabAttemptResult::ClickFailed(e.to_string())
            }
        }
    }

    /// Scrolls down in fixed steps so lazily rendered cards materialise.
    ///
    /// # Errors
    ///
    /// Returns the renderer error from the first failed scroll.
    pub async fn scroll_feed(&self) -> Result<(), RendererError> {
        for _ in 0..self.settings.scroll_steps {
            self.renderer.scroll(0, SCROLL_STEP_PX).await?;
            tokio::time::sleep(self.settings.scroll_settle).await;
        }
        Ok(())
    }

    /// Opens the first item card. Used after a detected change.
    ///
    /// # Errors
    ///
    /// Returns the renderer error if no card becomes visible or the click fails.
    pub async fn open_latest_item(&self) -> Result<(), RendererError> {
        let cards = self
            .renderer
            .wait_visible(&Locator::css(LATEST_ITEM), self.settings.element_timeout)
            .await?;
        if let Some(first) = cards.first() {
            self.renderer
                .click(first, self.settings.element_timeout)
                .await?;
        }
        Ok(())
    }
}

/// Text of the page `body`, looked up fresh. A handle that goes stale between
/// lookup and read yields empty text.
///
/// # Errors
///
/// Returns any other [`RendererError`] from the lookup or the read.
pub async fn page_text<R: Renderer + ?Sized>(renderer: &R) -> Result<String, RendererError> {
    let body = renderer.locate(&Locator::css("body")).await?;
    let Some(element) = body.first() else {
        return Ok(String::new());
    };
    match renderer.text(element).await {
        Ok(text) => Ok(text),
        Err(e) if e.is_stale_element() => {
            tracing::debug!(error = %e, "body went stale while reading page text");
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}

/// Block keywords found in `page_text`, compared case-insensitively, in
/// configuration order.
#[must_use]
pub fn match_block_keywords(page_text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = page_text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty() && haystack.contains(&k.to_lowercase()))
        .cloned()
        .collect()
}
