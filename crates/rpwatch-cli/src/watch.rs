//! Wiring for `run` and `once`: browser session, notifier, watcher.
//!
//! Startup preconditions (notifier credentials, a reachable WebDriver
//! endpoint, a decodable session blob) are fatal. Everything after the first
//! cycle starts is contained by the watcher.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context as _;
use rpwatch_core::WatchConfig;
use rpwatch_notifier::TelegramNotifier;
use rpwatch_renderer::{BrowserOptions, Renderer, StorageState, WebDriverRenderer};
use rpwatch_watcher::{run_forever, StateStore, WatchSettings, Watcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Once,
    Forever,
}

pub(crate) async fn run(config: WatchConfig, mode: Mode) -> anyhow::Result<()> {
    let notifier = build_notifier(&config)?;
    let storage_state = config
        .storage_state_b64
        .as_deref()
        .map(StorageState::from_base64)
        .transpose()
        .context("RPWATCH_STORAGE_STATE_B64 is not a usable session blob")?;

    let renderer = WebDriverRenderer::connect(&config.webdriver_url, &browser_options(&config))
        .await
        .with_context(|| format!("could not start a browser via {}", config.webdriver_url))?;

    let result = drive(&renderer, &notifier, &config, storage_state.as_ref(), mode).await;

    if let Err(e) = renderer.quit().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }
    result
}

async fn drive(
    renderer: &WebDriverRenderer,
    notifier: &TelegramNotifier,
    config: &WatchConfig,
    storage_state: Option<&StorageState>,
    mode: Mode,
) -> anyhow::Result<()> {
    prepare_session(renderer, config, storage_state).await;

    let store = StateStore::new(config.state_path.clone());
    let mut watcher = Watcher::new(renderer, notifier, store, WatchSettings::from_config(config));

    match mode {
        Mode::Once => {
            let outcome = watcher.run_cycle().await;
            println!("{outcome}");
        }
        Mode::Forever => {
            watcher.announce_startup().await;
            tokio::select! {
                () = run_forever(&mut watcher) => {},
                () = shutdown_signal() => {},
            }
        }
    }
    Ok(())
}

fn build_notifier(config: &WatchConfig) -> anyhow::Result<TelegramNotifier> {
    let mut notifier = TelegramNotifier::new(
        &config.telegram_bot_token,
        &config.telegram_chat_id,
        config.notify_timeout_secs,
    )?
    .with_retry(config.notify_max_retries, 1_000);
    if let Some(url) = config.webhook_url.as_deref() {
        notifier = notifier
            .with_webhook(url)
            .context("RPWATCH_WEBHOOK_URL is not a valid URL")?;
    }
    Ok(notifier)
}

fn browser_options(config: &WatchConfig) -> BrowserOptions {
    let language = config
        .accept_language
        .split(',')
        .next()
        .map(|l| l.split(';').next().unwrap_or(l).trim().to_owned())
        .filter(|l| !l.is_empty());
    BrowserOptions {
        headless: config.headless,
        user_agent: config.user_agent.clone(),
        language,
        command_timeout: Duration::from_secs(config.page_load_timeout_secs)
            .max(BrowserOptions::default().command_timeout),
        ..BrowserOptions::default()
    }
}

/// Seeds cookies/localStorage and installs extra request headers. Failures
/// here degrade the session but do not stop the watcher.
async fn prepare_session(
    renderer: &WebDriverRenderer,
    config: &WatchConfig,
    storage_state: Option<&StorageState>,
) {
    match storage_state {
        Some(state) if !state.is_empty() => {
            let timeout = Duration::from_secs(config.page_load_timeout_secs);
            if let Err(e) = state.apply(renderer, &config.site_origin, timeout).await {
                tracing::warn!(error = %e, "session seeding failed; continuing without it");
            }
        }
        Some(_) => tracing::warn!("storage state is empty; continuing without a session"),
        None => tracing::info!("no storage state configured; the site may limit anonymous access"),
    }

    let mut headers = BTreeMap::new();
    headers.insert("Accept-Language".to_owned(), config.accept_language.clone());
    if let Err(e) = renderer.set_request_headers(&headers).await {
        tracing::warn!(error = %e, "could not install extra request headers");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping watcher");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config() -> WatchConfig {
        WatchConfig {
            profile: "@someone".to_owned(),
            site_origin: "https://www.tiktok.com".to_owned(),
            check_interval_secs: 15,
            jitter_max_secs: 6,
            headless: true,
            debug: false,
            log_level: "info".to_owned(),
            telegram_bot_token: "123:abc".to_owned(),
            telegram_chat_id: "42".to_owned(),
            webhook_url: None,
            storage_state_b64: None,
            webdriver_url: "http://localhost:9515".to_owned(),
            state_path: PathBuf::from("./rpwatch_state.json"),
            tab_labels: vec!["Reposts".to_owned()],
            block_keywords: Vec::new(),
            accept_language: "pt-BR,pt;q=0.9,en;q=0.8".to_owned(),
            user_agent: None,
            page_load_timeout_secs: 45,
            element_timeout_ms: 6_000,
            nav_settle_ms: 1_500,
            tab_settle_ms: 1_200,
            scroll_steps: 3,
            scroll_settle_ms: 800,
            notify_timeout_secs: 15,
            notify_max_retries: 2,
            notify_on_error: true,
            open_on_detect: false,
        }
    }

    #[test]
    fn browser_language_is_first_accept_language_tag() {
        let options = browser_options(&config());
        assert_eq!(options.language.as_deref(), Some("pt-BR"));
        assert!(options.headless);
    }

    #[test]
    fn command_timeout_covers_page_load_timeout() {
        let options = browser_options(&config());
        assert!(options.command_timeout >= Duration::from_secs(45));
    }

    #[test]
    fn invalid_webhook_is_fatal() {
        let mut cfg = config();
        cfg.webhook_url = Some("not a url".to_owned());
        assert!(build_notifier(&cfg).is_err());
    }

    #[test]
    fn webhook_is_optional() {
        let notifier = build_notifier(&config()).unwrap();
        assert!(!notifier.has_webhook());
    }
}
