//! One watch cycle, end to end, behind a failure-isolation boundary.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt as _;
use rpwatch_core::WatchConfig;
use rpwatch_notifier::{deliver, NotificationEvent, Notifier};
use rpwatch_renderer::Renderer;
use serde_json::json;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::detector::detect;
use crate::diagnostics;
use crate::error::CycleError;
use crate::extractor::Extractor;
use crate::navigator::{Navigation, Navigator, NavigatorSettings};
use crate::normalize::{item_id, profile_url};
use crate::state::{StateStore, WatchState};
use crate::types::{CycleOutcome, DiagnosticContext, DiagnosticReason, TabAttempt};

/// Everything a [`Watcher`] needs from configuration, resolved once.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub profile_url: String,
    pub site_origin: String,
    pub navigator: NavigatorSettings,
    pub check_interval: Duration,
    pub jitter_max: Duration,
    pub notify_on_error: bool,
    pub open_on_detect: bool,
}

impl WatchSettings {
    #[must_use]
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            profile_url: profile_url(&config.profile, &config.site_origin),
            site_origin: config.site_origin.clone(),
            navigator: NavigatorSettings::from_config(config),
            check_interval: Duration::from_secs(config.check_interval_secs),
            jitter_max: Duration::from_secs(config.jitter_max_secs),
            notify_on_error: config.notify_on_error,
            open_on_detect: config.open_on_detect,
        }
    }
}

/// Owns the watch state and drives cycles against one renderer session.
pub struct Watcher<'a, R, N>
where
    R: Renderer + ?Sized,
    N: Notifier + ?Sized,
{
    renderer: &'a R,
    notifier: &'a N,
    store: StateStore,
    settings: WatchSettings,
    state: WatchState,
    last_reported_error: Option<String>,
}

impl<'a, R, N> Watcher<'a, R, N>
where
    R: Renderer + ?Sized,
    N: Notifier + ?Sized,
{
    /// Loads persisted state from `store`; unreadable state starts empty.
    pub fn new(
        renderer: &'a R,
        notifier: &'a N,
        store: StateStore,
        settings: WatchSettings,
    ) -> Self {
        let state = store.load();
        tracing::info!(
            profile = %settings.profile_url,
            state_path = %store.path().display(),
            baseline = state.last_seen_reference.as_deref().unwrap_or("none"),
            "watcher initialised"
        );
        Self {
            renderer,
            notifier,
            store,
            settings,
            state,
            last_reported_error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &WatchState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    pub async fn announce_startup(&self) -> bool {
        let event = NotificationEvent::Startup {
            profile_url: self.settings.profile_url.clone(),
            baseline: self.state.last_seen_reference.clone(),
        };
        deliver(self.notifier, &event).await
    }

    /// Runs one cycle. Never fails and never panics: typed errors and panics
    /// inside the cycle become [`CycleOutcome::Error`] with state untouched.
    /// Any other outcome re-arms error reporting.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", %cycle_id);

        let result = AssertUnwindSafe(self.execute())
            .catch_unwind()
            .instrument(span.clone())
            .await;
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => self.contain(&e).instrument(span.clone()).await,
            Err(panic) => {
                let e = CycleError::Panicked(panic_message(panic.as_ref()));
                self.contain(&e).instrument(span.clone()).await
            }
        };

        if !matches!(outcome, CycleOutcome::Error(_)) {
            self.last_reported_error = None;
        }

        span.in_scope(|| match &outcome {
            CycleOutcome::Baseline(r) => tracing::info!(reference = %r, "baseline recorded"),
            CycleOutcome::Unchanged => tracing::info!("no new repost"),
            CycleOutcome::Changed(r) => tracing::info!(reference = %r, "new repost detected"),
            CycleOutcome::ExtractionEmpty(ctx) | CycleOutcome::NavigationBlocked(ctx) => {
                tracing::warn!(
                    outcome = outcome.kind(),
                    reason = %ctx.reason,
                    "cycle produced no item"
                );
            }
            CycleOutcome::Error(message) => tracing::error!(error = %message, "cycle failed"),
        });
        outcome
    }

    async fn execute(&mut self) -> Result<CycleOutcome, CycleError> {
        let navigator = Navigator::new(self.renderer, &self.settings.navigator);

        let selection = match navigator.open_profile(&self.settings.profile_url).await? {
            Navigation::Ready(selection) => selection,
            Navigation::Blocked { matched_keywords } => {
                let ctx = self
                    .escalate(DiagnosticReason::BlockPage, matched_keywords, Vec::new())
                    .await;
                return Ok(CycleOutcome::NavigationBlocked(ctx));
            }
            Navigation::TabNotFound(selection) => {
                let ctx = self
                    .escalate(DiagnosticReason::TabNotFound, Vec::new(), selection.attempts)
                    .await;
                return Ok(CycleOutcome::NavigationBlocked(ctx));
            }
        };

        let extractor = Extractor::new(
            self.renderer,
            &self.settings.site_origin,
            self.settings.navigator.element_timeout,
        );
        let current = extractor.extract().await?;
        let outcome = detect(
            self.state.last_seen_reference.as_deref(),
            current.as_ref().map(|item| item.canonical_reference.as_str()),
        );

        match outcome {
            CycleOutcome::ExtractionEmpty(_) => {
                let ctx = self
                    .escalate(DiagnosticReason::NoItems, Vec::new(), selection.attempts)
                    .await;
                Ok(CycleOutcome::ExtractionEmpty(ctx))
            }
            CycleOutcome::Baseline(ref reference) => {
                self.record(reference).await;
                Ok(outcome)
            }
            CycleOutcome::Changed(ref reference) => {
                self.record(reference).await;
                self.announce_change(reference).await;
                if self.settings.open_on_detect {
                    let navigator = Navigator::new(self.renderer, &self.settings.navigator);
                    if let Err(e) = navigator.open_latest_item().await {
                        tracing::warn!(error = %e, "could not open the new item");
                    }
                }
                Ok(outcome)
            }
            other => Ok(other),
        }
    }

    async fn escalate(
        &self,
        reason: DiagnosticReason,
        matched_keywords: Vec<String>,
        tab_attempts: Vec<TabAttempt>,
    ) -> DiagnosticContext {
        let ctx = diagnostics::gather(
            self.renderer,
            reason,
            matched_keywords,
            tab_attempts,
            &self.settings.navigator.block_keywords,
        )
        .await;
        diagnostics::report(self.renderer, self.notifier, &self.settings.profile_url, &ctx).await;
        ctx
    }

    /// Updates state before any notification goes out. A failed save is
    /// reported but the in-memory state still moves on, so the same change
    /// is not alerted twice in this process.
    async fn record(&mut self, reference: &str) {
        self.state = WatchState::with_reference(reference);
        if let Err(e) = self.store.save(&self.state) {
            tracing::error!(error = %e, "state not persisted");
            if self.settings.notify_on_error {
                let event = NotificationEvent::RuntimeError {
                    message: format!("state not persisted: {e}"),
                };
                deliver(self.notifier, &event).await;
            }
        }
    }

    async fn announce_change(&self, reference: &str) {
        let event = NotificationEvent::NewItem {
            reference: reference.to_owned(),
        };
        deliver(self.notifier, &event).await;

        let payload = json!({
            "event": "new_repost_detected",
            "profile_url": self.settings.profile_url,
            "reference": reference,
            "item_id": item_id(reference),
            "ts": Utc::now().timestamp(),
        });
        if let Err(e) = self.notifier.post_event(&payload).await {
            tracing::warn!(error = %e, "webhook delivery failed");
        }
    }

    /// Reports a contained fault. The same message on consecutive cycles is
    /// only sent once.
    async fn contain(&mut self, error: &CycleError) -> CycleOutcome {
        let message = error.to_string();
        let repeated = self.last_reported_error.as_deref() == Some(message.as_str());
        if repeated {
            tracing::debug!("same cycle error as last time; notification suppressed");
        } else if self.settings.notify_on_error {
            let event = NotificationEvent::RuntimeError {
                message: message.clone(),
            };
            deliver(self.notifier, &event).await;
        }
        self.last_reported_error = Some(message.clone());
        CycleOutcome::Error(message)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
