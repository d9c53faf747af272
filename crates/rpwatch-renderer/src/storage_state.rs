//! Pre-authenticated browser session seeding.
//!
//! The session blob is a storage-state document (the JSON shape Playwright
//! writes with `context.storage_state()`), usually shipped base64-encoded in
//! an environment variable. Only cookies and `localStorage` are restored.

use std::time::Duration;

use base64::Engine as _;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::RendererError;
use crate::renderer::Renderer;
use crate::webdriver::WebDriverRenderer;

const RESTORE_LOCAL_STORAGE: &str =
    "for (const [k, v] of arguments[0]) { window.localStorage.setItem(k, v); }";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<StoredOrigin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    /// Unix seconds; `-1` marks a session cookie.
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default, rename = "httpOnly")]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, rename = "sameSite")]
    pub same_site: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredOrigin {
    pub origin: String,
    #[serde(default, rename = "localStorage")]
    pub local_storage: Vec<StoredEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredEntry {
    pub name: String,
    pub value: String,
}

/// What [`StorageState::apply`] actually installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub cookies_applied: usize,
    pub cookies_skipped: usize,
    pub local_storage_entries: usize,
}

fn root_path() -> String {
    "/".to_owned()
}

impl StorageState {
    /// Decodes a base64 storage-state blob.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::StorageState`] if the blob is not base64 or
    /// does not contain a storage-state JSON document.
    pub fn from_base64(blob: &str) -> Result<Self, RendererError> {
        let compact: String = blob.split_whitespace().collect();
        let raw = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| RendererError::StorageState(format!("not valid base64: {e}")))?;
        let text = String::from_utf8(raw)
            .map_err(|e| RendererError::StorageState(format!("not UTF-8: {e}")))?;
        Self::from_json(&text)
    }

    /// Parses a storage-state JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::StorageState`] on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, RendererError> {
        serde_json::from_str(text)
            .map_err(|e| RendererError::StorageState(format!("malformed JSON: {e}")))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
    }

    /// Cookies the browser will accept while a page on `host` is loaded:
    /// the cookie domain equals `host` or is a parent domain of it.
    #[must_use]
    pub fn cookies_for_host(&self, host: &str) -> Vec<&StoredCookie> {
        self.cookies
            .iter()
            .filter(|c| domain_matches(host, &c.domain))
            .collect()
    }

    /// `localStorage` entries recorded for exactly `origin`.
    #[must_use]
    pub fn local_storage_for(&self, origin: &str) -> Vec<&StoredEntry> {
        let origin = origin.trim_end_matches('/');
        self.origins
            .iter()
            .filter(|o| o.origin.trim_end_matches('/') == origin)
            .flat_map(|o| o.local_storage.iter())
            .collect()
    }

    /// Opens `site_origin` and installs the matching cookies and
    /// `localStorage` entries into the live session.
    ///
    /// Cookies for unrelated domains are skipped. A cookie the driver rejects
    /// is logged and skipped rather than failing the whole seed.
    ///
    /// # Errors
    ///
    /// - [`RendererError::InvalidUrl`] if `site_origin` has no host.
    /// - Any navigation or script error from the renderer.
    pub async fn apply(
        &self,
        renderer: &WebDriverRenderer,
        site_origin: &str,
        timeout: Duration,
    ) -> Result<SeedSummary, RendererError> {
        let host = Url::parse(site_origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .ok_or_else(|| RendererError::InvalidUrl {
                url: site_origin.to_owned(),
                reason: "origin has no host".to_owned(),
            })?;

        renderer.navigate(site_origin, timeout).await?;

        let matching = self.cookies_for_host(&host);
        let mut summary = SeedSummary {
            cookies_skipped: self.cookies.len() - matching.len(),
            ..SeedSummary::default()
        };

        for cookie in matching {
            match renderer.add_cookie(&cookie.to_webdriver()).await {
                Ok(()) => summary.cookies_applied += 1,
                Err(e) => {
                    tracing::warn!(
                        cookie = %cookie.name,
                        domain = %cookie.domain,
                        error = %e,
                        "cookie rejected by browser"
                    );
                    summary.cookies_skipped += 1;
                }
            }
        }

        let entries = self.local_storage_for(site_origin);
        if !entries.is_empty() {
            let pairs: Vec<Value> = entries
                .iter()
                .map(|e| json!([e.name, e.value]))
                .collect();
            renderer
                .execute_script(RESTORE_LOCAL_STORAGE, json!([pairs]))
                .await?;
            summary.local_storage_entries = entries.len();
        }

        tracing::info!(
            cookies_applied = summary.cookies_applied,
            cookies_skipped = summary.cookies_skipped,
            local_storage_entries = summary.local_storage_entries,
            "session seeded from storage state"
        );
        Ok(summary)
    }
}

impl StoredCookie {
    /// WebDriver cookie object. Session cookies carry no `expiry`.
    #[must_use]
    pub fn to_webdriver(&self) -> Value {
        let mut cookie = Map::new();
        cookie.insert("name".to_owned(), json!(self.name));
        cookie.insert("value".to_owned(), json!(self.value));
        cookie.insert("domain".to_owned(), json!(self.domain));
        cookie.insert("path".to_owned(), json!(self.path));
        cookie.insert("secure".to_owned(), json!(self.secure));
        cookie.insert("httpOnly".to_owned(), json!(self.http_only));
        if let Some(expires) = self.expires.filter(|e| *e > 0.0) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let expiry = expires as u64;
            cookie.insert("expiry".to_owned(), json!(expiry));
        }
        if let Some(same_site) = self.same_site.as_deref() {
            if matches!(same_site, "Strict" | "Lax" | "None") {
                cookie.insert("sameSite".to_owned(), json!(same_site));
            }
        }
        Value::Object(cookie)
    }
}

fn domain_matches(host: &str, cookie_domain: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.');
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
