//! Failure context for cycles that could not read an item.

use rpwatch_notifier::{deliver, NotificationEvent, Notifier};
use rpwatch_renderer::Renderer;

use crate::navigator::{match_block_keywords, page_text};
use crate::types::{DiagnosticContext, DiagnosticReason, TabAttempt};

/// Reads page title, URL and any visible block keywords into a context.
/// Keywords found now are appended to `matched_keywords` without duplicates,
/// so a block screen that appeared after the tab click still shows up.
/// Renderer failures leave the field empty.
pub async fn gather<R: Renderer + ?Sized>(
    renderer: &R,
    reason: DiagnosticReason,
    mut matched_keywords: Vec<String>,
    tab_attempts: Vec<TabAttempt>,
    block_keywords: &[String],
) -> DiagnosticContext {
    match page_text(renderer).await {
        Ok(text) => {
            for keyword in match_block_keywords(&text, block_keywords) {
                if !matched_keywords.contains(&keyword) {
                    matched_keywords.push(keyword);
                }
            }
        }
        Err(e) => tracing::debug!(error = %e, "page text unavailable"),
    }

    let title = match renderer.title().await {
        Ok(title) => Some(title),
        Err(e) => {
            tracing::debug!(error = %e, "page title unavailable");
            None
        }
    };
    let url = match renderer.current_url().await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!(error = %e, "current url unavailable");
            None
        }
    };

    DiagnosticContext {
        reason,
        title,
        url,
        matched_keywords,
        tab_attempts,
    }
}

/// Sends exactly one diagnostic notification, with a screenshot when the
/// renderer can take one. Returns whether an image was attached.
pub async fn report<R, N>(
    renderer: &R,
    notifier: &N,
    profile_url: &str,
    context: &DiagnosticContext,
) -> bool
where
    R: Renderer + ?Sized,
    N: Notifier + ?Sized,
{
    let image = match renderer.screenshot().await {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "screenshot failed; sending text-only diagnostic");
            None
        }
    };
    let with_image = image.is_some();
    let caption = caption(profile_url, context, with_image);

    tracing::warn!(reason = %context.reason, with_image, "reporting diagnostic");
    deliver(notifier, &NotificationEvent::Diagnostic { image, caption }).await;
    with_image
}

#[must_use]
pub fn caption(profile_url: &str, context: &DiagnosticContext, with_image: bool) -> String {
    let keywords = if context.matched_keywords.is_empty() {
        "none".to_owned()
    } else {
        context.matched_keywords.join(", ")
    };
    let tabs = if context.tab_attempts.is_empty() {
        "not attempted".to_owned()
    } else {
        context
            .tab_attempts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    };

    let mut out = format!(
        "rpwatch diagnostic: {}\nprofile: {profile_url}\ntitle: {}\nurl: {}\nblock keywords: {keywords}\ntabs: {tabs}",
        context.reason,
        context.title.as_deref().unwrap_or("-"),
        context.url.as_deref().unwrap_or("-"),
    );
    if !with_image {
        out.push_str("\nscreenshot: unavailable");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TabAttemptResult, TabHeuristic};

    fn context() -> DiagnosticContext {
        DiagnosticContext {
            reason: DiagnosticReason::TabNotFound,
            title: Some("Someone (@someone) | TikTok".to_owned()),
            url: None,
            matched_keywords: Vec::new(),
            tab_attempts: vec![
                TabAttempt {
                    heuristic: TabHeuristic::VisibleText,
                    target: "Reposts".to_owned(),
                    result: TabAttemptResult::NotFound,
                },
                TabAttempt {
                    heuristic: TabHeuristic::Position,
                    target: "#1".to_owned(),
                    result: TabAttemptResult::ClickFailed("not interactable".to_owned()),
                },
            ],
        }
    }

    #[test]
    fn caption_lists_page_context_and_tab_attempts() {
        let text = caption("https://www.tiktok.com/@someone", &context(), true);
        assert!(text.contains("repost tab could not be opened"));
        assert!(text.contains("title: Someone (@someone) | TikTok"));
        assert!(text.contains("url: -"));
        assert!(text.contains("text:Reposts=not found; position:#1=click failed"));
        assert!(!text.contains("screenshot"));
    }

    #[test]
    fn text_only_caption_says_so() {
        let text = caption("p", &context(), false);
        assert!(text.ends_with("screenshot: unavailable"));
    }

    #[test]
    fn caption_names_matched_keywords() {
        let mut ctx = DiagnosticContext::new(DiagnosticReason::BlockPage);
        ctx.matched_keywords = vec!["captcha".to_owned(), "security check".to_owned()];
        let text = caption("p", &ctx, true);
        assert!(text.contains("block keywords: captcha, security check"));
        assert!(text.contains("tabs: not attempted"));
    }
}
