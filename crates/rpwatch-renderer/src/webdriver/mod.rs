//! [`Renderer`] backed by a W3C WebDriver endpoint (`chromedriver`).
//!
//! Chrome-specific capabilities (full-page screenshots, extra request
//! headers) go through chromedriver's `goog/cdp/execute` extension.

mod capabilities;
mod command;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Method, Url};
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::element::{ElementHandle, ElementSet};
use crate::error::RendererError;
use crate::locator::Locator;
use crate::renderer::Renderer;

pub use capabilities::BrowserOptions;
use command::{element_ids, execute, millis};

/// Extra allowance on the HTTP request so the driver's own page-load timeout
/// fires first and comes back as a typed error.
const NAVIGATION_SLACK: Duration = Duration::from_secs(5);

/// Session creation launches a browser, which is slower than any command.
const NEW_SESSION_TIMEOUT: Duration = Duration::from_secs(60);

/// A live WebDriver session.
///
/// Use [`WebDriverRenderer::connect`] to start a browser. The session is not
/// closed on drop; call [`WebDriverRenderer::quit`] on shutdown.
pub struct WebDriverRenderer {
    client: Client,
    base_url: Url,
    session_id: String,
    command_timeout: Duration,
    poll_interval: Duration,
}

impl WebDriverRenderer {
    /// Creates a new browser session on the WebDriver server at `webdriver_url`.
    ///
    /// # Errors
    ///
    /// - [`RendererError::InvalidUrl`] if `webdriver_url` is not a valid URL.
    /// - [`RendererError::Http`] if the server is unreachable.
    /// - [`RendererError::Command`] if the server refuses the session.
    pub async fn connect(
        webdriver_url: &str,
        options: &BrowserOptions,
    ) -> Result<Self, RendererError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", webdriver_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| RendererError::InvalidUrl {
            url: webdriver_url.to_owned(),
            reason: e.to_string(),
        })?;

        let url = join(&base_url, "session")?;
        let body = json!({
            "capabilities": { "alwaysMatch": options.chrome_capabilities() }
        });
        let value = execute(
            &client,
            Method::POST,
            url,
            Some(&body),
            NEW_SESSION_TIMEOUT.max(options.command_timeout),
            "new session",
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RendererError::Command {
                command: "new session".to_owned(),
                error: "invalid session response".to_owned(),
                message: value.to_string(),
            })?
            .to_owned();

        tracing::info!(session_id, headless = options.headless, "webdriver session created");

        Ok(Self {
            client,
            base_url,
            session_id,
            command_timeout: options.command_timeout,
            poll_interval: options.poll_interval,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ends the session and closes the browser.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`RendererError`] if the driver rejects the request.
    pub async fn quit(&self) -> Result<(), RendererError> {
        self.call(Method::DELETE, "", None, self.command_timeout, "delete session")
            .await?;
        tracing::info!(session_id = %self.session_id, "webdriver session closed");
        Ok(())
    }

    /// Installs one cookie on the current document's domain.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Command`] if the driver rejects the cookie
    /// (typically a domain mismatch with the current page).
    pub async fn add_cookie(&self, cookie: &Value) -> Result<(), RendererError> {
        let body = json!({ "cookie": cookie });
        self.call(
            Method::POST,
            "cookie",
            Some(&body),
            self.command_timeout,
            "add cookie",
        )
        .await?;
        Ok(())
    }

    /// Runs a synchronous script in the page and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Command`] if the script throws.
    pub async fn execute_script(&self, script: &str, args: Value) -> Result<Value, RendererError> {
        let body = json!({ "script": script, "args": args });
        self.call(
            Method::POST,
            "execute/sync",
            Some(&body),
            self.command_timeout,
            "execute script",
        )
        .await
    }

    async fn cdp(&self, cmd: &str, params: Value) -> Result<Value, RendererError> {
        let body = json!({ "cmd": cmd, "params": params });
        self.call(
            Method::POST,
            "goog/cdp/execute",
            Some(&body),
            self.command_timeout,
            cmd,
        )
        .await
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, RendererError> {
        let path = format!("element/{}/displayed", element.id());
        let value = self
            .call(Method::GET, &path, None, self.command_timeout, "is displayed")
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn viewport_screenshot(&self) -> Result<Vec<u8>, RendererError> {
        let value = self
            .call(Method::GET, "screenshot", None, self.command_timeout, "screenshot")
            .await?;
        decode_png(&value)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Duration,
        command: &str,
    ) -> Result<Value, RendererError> {
        let url = self.endpoint(path)?;
        execute(&self.client, method, url, body, timeout, command).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, RendererError> {
        if path.is_empty() {
            join(&self.base_url, &format!("session/{}", self.session_id))
        } else {
            join(&self.base_url, &format!("session/{}/{path}", self.session_id))
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), RendererError> {
        let timeouts = json!({ "pageLoad": millis(timeout) });
        self.call(
            Method::POST,
            "timeouts",
            Some(&timeouts),
            self.command_timeout,
            "set timeouts",
        )
        .await?;

        let body = json!({ "url": url });
        self.call(
            Method::POST,
            "url",
            Some(&body),
            timeout + NAVIGATION_SLACK,
            "navigate",
        )
        .await
        .map_err(|e| match e {
            RendererError::Timeout { what, .. } => RendererError::Timeout {
                what,
                after_ms: millis(timeout),
            },
            other => other,
        })?;
        tracing::debug!(url, "navigated");
        Ok(())
    }

    async fn locate(&self, locator: &Locator) -> Result<ElementSet, RendererError> {
        let body = json!({ "using": locator.strategy(), "value": locator.expression() });
        let value = self
            .call(
                Method::POST,
                "elements",
                Some(&body),
                self.command_timeout,
                "find elements",
            )
            .await?;
        let handles = element_ids(&value)
            .into_iter()
            .map(ElementHandle::new)
            .collect();
        Ok(ElementSet::new(locator.clone(), handles))
    }

    async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementSet, RendererError> {
        let started = Instant::now();
        loop {
            let set = self.locate(locator).await?;
            if let Some(first) = set.first() {
                match self.is_displayed(first).await {
                    Ok(true) => return Ok(set),
                    Ok(false) => {}
                    Err(e) if e.is_stale_element() => {}
                    Err(e) => return Err(e),
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(RendererError::Timeout {
                    what: format!("{locator} to become visible"),
                    after_ms: millis(timeout),
                });
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RendererError> {
        let path = format!("element/{}/attribute/{name}", element.id());
        let value = self
            .call(Method::GET, &path, None, self.command_timeout, "get attribute")
            .await?;
        Ok(value.as_str().map(str::to_owned))
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, RendererError> {
        let path = format!("element/{}/text", element.id());
        let value = self
            .call(Method::GET, &path, None, self.command_timeout, "get text")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_owned())
    }

    async fn click(&self, element: &ElementHandle, timeout: Duration) -> Result<(), RendererError> {
        let path = format!("element/{}/click", element.id());
        self.call(Method::POST, &path, Some(&json!({})), timeout, "click")
            .await?;
        Ok(())
    }

    async fn scroll(&self, dx: i64, dy: i64) -> Result<(), RendererError> {
        self.execute_script("window.scrollBy(arguments[0], arguments[1]);", json!([dx, dy]))
            .await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, RendererError> {
        let params = json!({ "format": "png", "captureBeyondViewport": true });
        match self.cdp("Page.captureScreenshot", params).await {
            Ok(value) => decode_png(value.get("data").unwrap_or(&Value::Null)),
            Err(e @ RendererError::Command { .. }) => {
                tracing::debug!(error = %e, "full-page capture unavailable; using viewport screenshot");
                self.viewport_screenshot().await
            }
            Err(e) => Err(e),
        }
    }

    async fn title(&self) -> Result<String, RendererError> {
        let value = self
            .call(Method::GET, "title", None, self.command_timeout, "get title")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_owned())
    }

    async fn current_url(&self) -> Result<String, RendererError> {
        let value = self
            .call(Method::GET, "url", None, self.command_timeout, "get url")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_owned())
    }

    async fn set_request_headers(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), RendererError> {
        self.cdp("Network.enable", json!({})).await?;
        self.cdp("Network.setExtraHTTPHeaders", json!({ "headers": headers }))
            .await?;
        tracing::debug!(count = headers.len(), "extra request headers installed");
        Ok(())
    }
}

fn join(base: &Url, path: &str) -> Result<Url, RendererError> {
    base.join(path).map_err(|e| RendererError::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}

fn decode_png(value: &Value) -> Result<Vec<u8>, RendererError> {
    let encoded = value.as_str().ok_or_else(|| RendererError::Command {
        command: "screenshot".to_owned(),
        error: "invalid screenshot response".to_owned(),
        message: "expected a base64 string".to_owned(),
    })?;
    Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
}
