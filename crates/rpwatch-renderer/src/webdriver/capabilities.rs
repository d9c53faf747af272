use std::time::Duration;

use serde_json::{json, Value};

/// Browser launch options translated into WebDriver capabilities.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    /// Primary UI language, e.g. `en-US`.
    pub language: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    /// Upper bound for commands that take no explicit timeout.
    pub command_timeout: Duration,
    /// Interval between visibility polls in `wait_visible`.
    pub poll_interval: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: None,
            language: None,
            window_width: 1280,
            window_height: 2000,
            command_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl BrowserOptions {
    /// `alwaysMatch` capabilities for a Chrome session.
    ///
    /// `pageLoadStrategy: eager` returns from navigation at
    /// `DOMContentLoaded`; the rest of the page is script-injected anyway.
    #[must_use]
    pub fn chrome_capabilities(&self) -> Value {
        let mut args = vec![
            "--disable-blink-features=AutomationControlled".to_owned(),
            "--no-sandbox".to_owned(),
            "--disable-dev-shm-usage".to_owned(),
            format!("--window-size={},{}", self.window_width, self.window_height),
        ];
        if self.headless {
            args.push("--headless=new".to_owned());
        }
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        if let Some(lang) = &self.language {
            args.push(format!("--lang={lang}"));
        }

        json!({
            "browserName": "chrome",
            "pageLoadStrategy": "eager",
            "goog:chromeOptions": {
                "args": args,
                "excludeSwitches": ["enable-automation"],
            },
        })
    }
}
