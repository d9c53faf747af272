//! In-memory `Renderer` and `Notifier` doubles for cycle tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rpwatch_core::DEFAULT_BLOCK_KEYWORDS;
use rpwatch_notifier::{Notifier, NotifierError};
use rpwatch_renderer::{ElementHandle, ElementSet, Locator, Renderer, RendererError};
use rpwatch_watcher::{NavigatorSettings, WatchSettings};

pub const ORIGIN: &str = "https://www.tiktok.com";
pub const PROFILE_URL: &str = "https://www.tiktok.com/@someone";
pub const REPOST_TIER: &str = r#"[data-e2e="user-repost-item"] a[href*="/video/"]"#;
pub const POST_TIER: &str = r#"[data-e2e="user-post-item"] a[href*="/video/"]"#;
pub const ANY_VIDEO: &str = r#"a[href*="/video/"]"#;
pub const TAB_LIST: &str = r#"[role="tablist"] [role="tab"]"#;

#[derive(Debug, Clone)]
struct FakeElement {
    id: String,
    href: Option<String>,
}

/// Page model the fake renders. Elements are keyed by the locator's
/// `Display` form so tests match exactly what the watcher asks for.
#[derive(Debug, Default)]
struct Page {
    body_visible: bool,
    body_text: String,
    title: String,
    url: String,
    elements: HashMap<String, Vec<FakeElement>>,
    clickable: HashSet<String>,
    screenshot: Option<Vec<u8>>,
    fail_navigation: bool,
    panic_on_navigation: bool,
    body_text_after_click: Option<String>,
    stale_body_reads: u32,
}

#[derive(Debug, Default)]
pub struct FakeRenderer {
    page: Mutex<Page>,
    calls: Mutex<Vec<String>>,
}

fn key(locator: &Locator) -> String {
    locator.to_string()
}

impl FakeRenderer {
    /// A healthy profile page whose "Reposts" tab opens by visible text.
    pub fn profile() -> Self {
        let renderer = Self::default();
        {
            let mut page = renderer.page.lock().unwrap();
            page.body_visible = true;
            page.body_text = "someone Following 10 Followers 2k Videos Reposts".to_owned();
            page.title = "someone (@someone) | TikTok".to_owned();
            page.url = PROFILE_URL.to_owned();
            page.screenshot = Some(vec![0x89, b'P', b'N', b'G']);
        }
        renderer.add_tab(&Locator::visible_text("Reposts"), true);
        renderer
    }

    /// A page that exposes no labelled tab at all.
    pub fn profile_without_tabs() -> Self {
        let renderer = Self::profile();
        {
            let mut page = renderer.page.lock().unwrap();
            page.elements.clear();
            page.clickable.clear();
        }
        renderer
    }

    pub fn add_tab(&self, locator: &Locator, clickable: bool) {
        let id = format!("tab:{}", key(locator));
        let mut page = self.page.lock().unwrap();
        if clickable {
            page.clickable.insert(id.clone());
        }
        page.elements
            .entry(key(locator))
            .or_default()
            .push(FakeElement { id, href: None });
    }

    /// Tab list entries; `clickable` holds the positions that accept a click.
    pub fn set_tab_list(&self, len: usize, clickable: &[usize]) {
        let mut page = self.page.lock().unwrap();
        let elements = (0..len)
            .map(|i| FakeElement {
                id: format!("tablist#{i}"),
                href: None,
            })
            .collect();
        page.elements.insert(key(&Locator::css(TAB_LIST)), elements);
        for i in clickable {
            page.clickable.insert(format!("tablist#{i}"));
        }
    }

    /// Replaces the items matched by `selector`, in document order.
    pub fn set_items(&self, selector: &str, hrefs: &[&str]) {
        let k = key(&Locator::css(selector));
        let elements = hrefs
            .iter()
            .enumerate()
            .map(|(i, href)| FakeElement {
                id: format!("{selector}#{i}"),
                href: Some((*href).to_owned()),
            })
            .collect();
        let mut page = self.page.lock().unwrap();
        page.elements.insert(k, elements);
    }

    /// Shows `href` as the newest repost in every tier that would match it.
    pub fn show_latest(&self, href: &str) {
        self.set_items(REPOST_TIER, &[href]);
        self.set_items(ANY_VIDEO, &[href]);
        self.make_clickable(&format!("{ANY_VIDEO}#0"));
    }

    pub fn clear_items(&self) {
        for selector in [REPOST_TIER, POST_TIER, ANY_VIDEO] {
            self.set_items(selector, &[]);
        }
    }

    pub fn make_clickable(&self, id: &str) {
        self.page.lock().unwrap().clickable.insert(id.to_owned());
    }

    pub fn set_body_text(&self, text: &str) {
        self.page.lock().unwrap().body_text = text.to_owned();
    }

    /// Replaces the body text once any click succeeds, like a block screen
    /// injected after the tab opens.
    pub fn set_body_text_after_click(&self, text: &str) {
        self.page.lock().unwrap().body_text_after_click = Some(text.to_owned());
    }

    /// The next `count` reads of the body text fail with a stale element.
    pub fn stale_body_reads(&self, count: u32) {
        self.page.lock().unwrap().stale_body_reads = count;
    }

    pub fn fail_screenshots(&self) {
        self.page.lock().unwrap().screenshot = None;
    }

    pub fn fail_navigation(&self, fail: bool) {
        self.page.lock().unwrap().fail_navigation = fail;
    }

    pub fn panic_on_navigation(&self, panic: bool) {
        self.page.lock().unwrap().panic_on_navigation = panic;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("click ").map(str::to_owned))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, locator: &Locator) -> Vec<FakeElement> {
        let page = self.page.lock().unwrap();
        if *locator == Locator::css("body") {
            return if page.body_visible {
                vec![FakeElement {
                    id: "body".to_owned(),
                    href: None,
                }]
            } else {
                Vec::new()
            };
        }
        page.elements.get(&key(locator)).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), RendererError> {
        self.record(format!("navigate {url}"));
        let (fail, panic) = {
            let page = self.page.lock().unwrap();
            (page.fail_navigation, page.panic_on_navigation)
        };
        assert!(!panic, "renderer exploded");
        if fail {
            return Err(RendererError::Timeout {
                what: "navigate".to_owned(),
                after_ms: 30_000,
            });
        }
        Ok(())
    }

    async fn locate(&self, locator: &Locator) -> Result<ElementSet, RendererError> {
        self.record(format!("locate {locator}"));
        let handles = self
            .lookup(locator)
            .into_iter()
            .map(|e| ElementHandle::new(e.id))
            .collect();
        Ok(ElementSet::new(locator.clone(), handles))
    }

    async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementSet, RendererError> {
        let set = self.locate(locator).await?;
        if set.is_empty() {
            return Err(RendererError::Timeout {
                what: format!("{locator} to become visible"),
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(set)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RendererError> {
        if name != "href" {
            return Ok(None);
        }
        let page = self.page.lock().unwrap();
        Ok(page
            .elements
            .values()
            .flatten()
            .find(|e| e.id == element.id())
            .and_then(|e| e.href.clone()))
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, RendererError> {
        let mut page = self.page.lock().unwrap();
        if element.id() == "body" && page.stale_body_reads > 0 {
            page.stale_body_reads -= 1;
            return Err(RendererError::Command {
                command: "text".to_owned(),
                error: "stale element reference".to_owned(),
                message: "body".to_owned(),
            });
        }
        Ok(if element.id() == "body" {
            page.body_text.clone()
        } else {
            String::new()
        })
    }

    async fn click(&self, element: &ElementHandle, _timeout: Duration) -> Result<(), RendererError> {
        let clickable = {
            let mut page = self.page.lock().unwrap();
            let clickable = page.clickable.contains(element.id());
            if clickable {
                if let Some(text) = page.body_text_after_click.take() {
                    page.body_text = text;
                }
            }
            clickable
        };
        if !clickable {
            return Err(RendererError::Command {
                command: "click".to_owned(),
                error: "element not interactable".to_owned(),
                message: element.id().to_owned(),
            });
        }
        self.record(format!("click {}", element.id()));
        Ok(())
    }

    async fn scroll(&self, dx: i64, dy: i64) -> Result<(), RendererError> {
        self.record(format!("scroll {dx},{dy}"));
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, RendererError> {
        self.page
            .lock()
            .unwrap()
            .screenshot
            .clone()
            .ok_or_else(|| RendererError::Command {
                command: "screenshot".to_owned(),
                error: "unknown error".to_owned(),
                message: "tab crashed".to_owned(),
            })
    }

    async fn title(&self) -> Result<String, RendererError> {
        Ok(self.page.lock().unwrap().title.clone())
    }

    async fn current_url(&self) -> Result<String, RendererError> {
        Ok(self.page.lock().unwrap().url.clone())
    }

    async fn set_request_headers(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), RendererError> {
        self.record(format!("headers {}", headers.len()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String),
    Image { bytes: usize, caption: String },
    Event(serde_json::Value),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn new_item_alerts(&self) -> Vec<String> {
        self.texts()
            .into_iter()
            .filter(|t| t.starts_with("New repost detected"))
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| match s {
                Sent::Image { caption, .. } => caption.starts_with("rpwatch diagnostic"),
                Sent::Text(t) => t.starts_with("rpwatch diagnostic"),
                Sent::Event(_) => false,
            })
            .collect()
    }

    pub fn runtime_errors(&self) -> Vec<String> {
        self.texts()
            .into_iter()
            .filter(|t| t.starts_with("rpwatch cycle error"))
            .collect()
    }

    pub fn events(&self) -> Vec<serde_json::Value> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Event(v) => Some(v),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, message: &str) -> Result<(), NotifierError> {
        self.sent.lock().unwrap().push(Sent::Text(message.to_owned()));
        Ok(())
    }

    async fn send_image(&self, image: &[u8], caption: &str) -> Result<(), NotifierError> {
        self.sent.lock().unwrap().push(Sent::Image {
            bytes: image.len(),
            caption: caption.to_owned(),
        });
        Ok(())
    }

    async fn post_event(&self, payload: &serde_json::Value) -> Result<(), NotifierError> {
        self.sent.lock().unwrap().push(Sent::Event(payload.clone()));
        Ok(())
    }
}

/// Settings with every wait zeroed.
pub fn settings() -> WatchSettings {
    WatchSettings {
        profile_url: PROFILE_URL.to_owned(),
        site_origin: ORIGIN.to_owned(),
        navigator: NavigatorSettings {
            page_load_timeout: Duration::from_secs(1),
            element_timeout: Duration::from_millis(10),
            nav_settle: Duration::ZERO,
            tab_settle: Duration::ZERO,
            scroll_steps: 2,
            scroll_settle: Duration::ZERO,
            tab_labels: vec!["Reposts".to_owned(), "Republicações".to_owned()],
            tab_positions: vec![1, 2],
            block_keywords: DEFAULT_BLOCK_KEYWORDS
                .iter()
                .map(|k| (*k).to_owned())
                .collect(),
        },
        check_interval: Duration::ZERO,
        jitter_max: Duration::ZERO,
        notify_on_error: true,
        open_on_detect: false,
    }
}
