//! Page rendering seam for the repost watcher.
//!
//! [`Renderer`] is the capability surface the watcher drives. The production
//! implementation, [`WebDriverRenderer`], speaks the W3C WebDriver protocol to
//! a running `chromedriver` (or any compatible endpoint) over HTTP.

pub mod element;
pub mod error;
pub mod locator;
pub mod renderer;
pub mod storage_state;
pub mod webdriver;

pub use element::{ElementHandle, ElementSet};
pub use error::RendererError;
pub use locator::{xpath_literal, Locator};
pub use renderer::Renderer;
pub use storage_state::{SeedSummary, StorageState, StoredCookie, StoredOrigin};
pub use webdriver::{BrowserOptions, WebDriverRenderer};
