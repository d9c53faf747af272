use crate::notifier::Notifier;

/// Longest runtime-error text forwarded to the channel.
const ERROR_MESSAGE_LIMIT: usize = 500;

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The watcher is up. `baseline` is the persisted reference, if any.
    Startup {
        profile_url: String,
        baseline: Option<String>,
    },
    /// The newest item on the watched profile changed.
    NewItem { reference: String },
    /// Extraction or navigation failed; carries a screenshot when one could
    /// be captured.
    Diagnostic {
        image: Option<Vec<u8>>,
        caption: String,
    },
    RuntimeError { message: String },
}

impl NotificationEvent {
    /// Short name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Startup { .. } => "startup",
            Self::NewItem { .. } => "new_item",
            Self::Diagnostic { .. } => "diagnostic",
            Self::RuntimeError { .. } => "runtime_error",
        }
    }

    /// Human-readable message text.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Startup {
                profile_url,
                baseline,
            } => format!(
                "rpwatch started\nprofile: {profile_url}\nbaseline: {}",
                baseline.as_deref().unwrap_or("none yet")
            ),
            Self::NewItem { reference } => format!("New repost detected\n{reference}"),
            Self::Diagnostic { caption, .. } => caption.clone(),
            Self::RuntimeError { message } => format!(
                "rpwatch cycle error: {}",
                truncate_chars(message, ERROR_MESSAGE_LIMIT)
            ),
        }
    }
}

/// Delivers `event` through `notifier`.
///
/// Never fails: errors are logged and reported as `false`. A diagnostic whose
/// image upload is rejected is retried once as plain text so the operator
/// still gets the context.
pub async fn deliver<N>(notifier: &N, event: &NotificationEvent) -> bool
where
    N: Notifier + ?Sized,
{
    let text = event.render();
    let result = match event {
        NotificationEvent::Diagnostic {
            image: Some(image), ..
        } => match notifier.send_image(image, &text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "diagnostic image upload failed, sending text only");
                notifier.send_text(&text).await
            }
        },
        _ => notifier.send_text(&text).await,
    };

    match result {
        Ok(()) => {
            tracing::debug!(kind = event.kind(), "notification delivered");
            true
        }
        Err(e) => {
            tracing::error!(kind = event.kind(), error = %e, "notification delivery failed");
            false
        }
    }
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with `…`.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}
