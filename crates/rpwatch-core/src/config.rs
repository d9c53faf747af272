use std::path::PathBuf;

use crate::watch_config::{WatchConfig, DEFAULT_BLOCK_KEYWORDS, DEFAULT_TAB_LABELS};
use crate::ConfigError;

/// Load watcher configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_watch_config() -> Result<WatchConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_watch_config_from_env()
}

/// Load watcher configuration from environment variables already in the process.
///
/// Unlike [`load_watch_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_watch_config_from_env() -> Result<WatchConfig, ConfigError> {
    build_watch_config(|key| std::env::var(key))
}

/// Build watcher configuration using the provided env-var lookup function.
///
/// Blank values are treated the same as unset ones, so an exported but empty
/// `RPWATCH_WEBHOOK_URL=` disables the webhook instead of failing validation.
fn build_watch_config<F>(lookup: F) -> Result<WatchConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let present = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        present(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        present(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(var, &or_default(var, default))
    };

    let profile = require("RPWATCH_PROFILE")?;
    let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;
    let telegram_chat_id = require("TELEGRAM_CHAT_ID")?;

    let site_origin = parse_origin(
        "RPWATCH_SITE_ORIGIN",
        &or_default("RPWATCH_SITE_ORIGIN", "https://www.tiktok.com"),
    )?;

    let check_interval_secs = parse_u64("RPWATCH_CHECK_INTERVAL_SECS", "15")?;
    if check_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "RPWATCH_CHECK_INTERVAL_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let jitter_max_secs = parse_u64("RPWATCH_JITTER_MAX_SECS", "6")?;

    let headless = parse_flag("RPWATCH_HEADLESS", "true")?;
    let debug = parse_flag("RPWATCH_DEBUG", "false")?;
    let log_level = or_default("RPWATCH_LOG_LEVEL", "info");

    let webhook_url = present("RPWATCH_WEBHOOK_URL");
    let storage_state_b64 = present("RPWATCH_STORAGE_STATE_B64");
    let webdriver_url = or_default("RPWATCH_WEBDRIVER_URL", "http://localhost:9515");
    let state_path = PathBuf::from(or_default("RPWATCH_STATE_PATH", "./rpwatch_state.json"));

    let tab_labels = present("RPWATCH_TAB_LABELS").map_or_else(
        || DEFAULT_TAB_LABELS.iter().map(ToString::to_string).collect(),
        |raw| split_list(&raw),
    );
    if tab_labels.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "RPWATCH_TAB_LABELS".to_string(),
            reason: "at least one label is required".to_string(),
        });
    }
    let block_keywords = present("RPWATCH_BLOCK_KEYWORDS").map_or_else(
        || DEFAULT_BLOCK_KEYWORDS.iter().map(ToString::to_string).collect(),
        |raw| split_list(&raw),
    );

    let accept_language = or_default("RPWATCH_ACCEPT_LANGUAGE", "en-US,en;q=0.9");
    let user_agent = present("RPWATCH_USER_AGENT");

    let page_load_timeout_secs = parse_u64("RPWATCH_PAGE_LOAD_TIMEOUT_SECS", "30")?;
    let element_timeout_ms = parse_u64("RPWATCH_ELEMENT_TIMEOUT_MS", "6000")?;
    let nav_settle_ms = parse_u64("RPWATCH_NAV_SETTLE_MS", "1500")?;
    let tab_settle_ms = parse_u64("RPWATCH_TAB_SETTLE_MS", "1200")?;
    let scroll_steps = parse_u32("RPWATCH_SCROLL_STEPS", "3")?;
    let scroll_settle_ms = parse_u64("RPWATCH_SCROLL_SETTLE_MS", "800")?;

    let notify_timeout_secs = parse_u64("RPWATCH_NOTIFY_TIMEOUT_SECS", "15")?;
    let notify_max_retries = parse_u32("RPWATCH_NOTIFY_MAX_RETRIES", "2")?;
    let notify_on_error = parse_flag("RPWATCH_NOTIFY_ON_ERROR", "true")?;
    let open_on_detect = parse_flag("RPWATCH_OPEN_ON_DETECT", "false")?;

    Ok(WatchConfig {
        profile,
        site_origin,
        check_interval_secs,
        jitter_max_secs,
        headless,
        debug,
        log_level,
        telegram_bot_token,
        telegram_chat_id,
        webhook_url,
        storage_state_b64,
        webdriver_url,
        state_path,
        tab_labels,
        block_keywords,
        accept_language,
        user_agent,
        page_load_timeout_secs,
        element_timeout_ms,
        nav_settle_ms,
        tab_settle_ms,
        scroll_steps,
        scroll_settle_ms,
        notify_timeout_secs,
        notify_max_retries,
        notify_on_error,
        open_on_detect,
    })
}

/// Parse a boolean flag. Accepts `1/true/yes/y` and `0/false/no/n`, case-insensitively.
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

/// Validate an `http(s)://host` origin and strip any trailing slash.
fn parse_origin(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match host {
        Some(h) if !h.is_empty() && !h.contains('/') => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("\"{raw}\" is not an http(s) origin"),
        }),
    }
}

/// Split a comma-separated list, dropping blank entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
