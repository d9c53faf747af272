use std::path::PathBuf;

/// Tab labels tried in order when no `RPWATCH_TAB_LABELS` override is set.
pub const DEFAULT_TAB_LABELS: [&str; 2] = ["Reposts", "Republicações"];

/// Page-text fragments that indicate an error, rate-limit or verification
/// wall instead of the profile. Matched case-insensitively.
pub const DEFAULT_BLOCK_KEYWORDS: [&str; 10] = [
    "something went wrong",
    "algo deu errado",
    "captcha",
    "verify to continue",
    "drag the slider",
    "too many attempts",
    "access denied",
    "security check",
    "verificação de segurança",
    "tente novamente mais tarde",
];

/// Process-wide watcher settings, read once at startup.
#[derive(Clone)]
pub struct WatchConfig {
    /// Handle (`@user` or `user`) or full profile URL.
    pub profile: String,
    pub site_origin: String,
    pub check_interval_secs: u64,
    /// Upper bound (inclusive) of the uniform jitter added to each sleep.
    pub jitter_max_secs: u64,
    pub headless: bool,
    pub debug: bool,
    pub log_level: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub webhook_url: Option<String>,
    /// Base64-encoded storage-state JSON used to seed the browser session.
    pub storage_state_b64: Option<String>,
    pub webdriver_url: String,
    pub state_path: PathBuf,
    pub tab_labels: Vec<String>,
    pub block_keywords: Vec<String>,
    pub accept_language: String,
    pub user_agent: Option<String>,
    pub page_load_timeout_secs: u64,
    pub element_timeout_ms: u64,
    pub nav_settle_ms: u64,
    pub tab_settle_ms: u64,
    pub scroll_steps: u32,
    pub scroll_settle_ms: u64,
    pub notify_timeout_secs: u64,
    pub notify_max_retries: u32,
    pub notify_on_error: bool,
    pub open_on_detect: bool,
}

impl WatchConfig {
    /// Tracing filter directive used when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("profile", &self.profile)
            .field("site_origin", &self.site_origin)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("jitter_max_secs", &self.jitter_max_secs)
            .field("headless", &self.headless)
            .field("debug", &self.debug)
            .field("log_level", &self.log_level)
            .field("telegram_bot_token", &"[redacted]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[redacted]"))
            .field(
                "storage_state_b64",
                &self.storage_state_b64.as_ref().map(|_| "[redacted]"),
            )
            .field("webdriver_url", &self.webdriver_url)
            .field("state_path", &self.state_path)
            .field("tab_labels", &self.tab_labels)
            .field("block_keywords", &self.block_keywords)
            .field("accept_language", &self.accept_language)
            .field("user_agent", &self.user_agent)
            .field("page_load_timeout_secs", &self.page_load_timeout_secs)
            .field("element_timeout_ms", &self.element_timeout_ms)
            .field("nav_settle_ms", &self.nav_settle_ms)
            .field("tab_settle_ms", &self.tab_settle_ms)
            .field("scroll_steps", &self.scroll_steps)
            .field("scroll_settle_ms", &self.scroll_settle_ms)
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("notify_max_retries", &self.notify_max_retries)
            .field("notify_on_error", &self.notify_on_error)
            .field("open_on_detect", &self.open_on_detect)
            .finish()
    }
}
