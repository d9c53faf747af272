use std::time::Duration;

use rand::Rng as _;
use rpwatch_notifier::Notifier;
use rpwatch_renderer::Renderer;

use crate::cycle::Watcher;

/// `base` plus a uniform random extra in `[0, jitter_max]`, at millisecond
/// resolution.
#[must_use]
pub fn jittered_delay(base: Duration, jitter_max: Duration) -> Duration {
    let jitter_ms = u64::try_from(jitter_max.as_millis()).unwrap_or(u64::MAX);
    if jitter_ms == 0 {
        return base;
    }
    let extra = rand::rng().random_range(0..=jitter_ms);
    base + Duration::from_millis(extra)
}

/// Runs cycles until the task is cancelled. The first cycle starts
/// immediately; each later one waits a jittered interval.
pub async fn run_forever<R, N>(watcher: &mut Watcher<'_, R, N>)
where
    R: Renderer + ?Sized,
    N: Notifier + ?Sized,
{
    loop {
        let outcome = watcher.run_cycle().await;

        let settings = watcher.settings();
        let delay = jittered_delay(settings.check_interval, settings.jitter_max);
        tracing::debug!(
            outcome = outcome.kind(),
            sleep_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "sleeping until next cycle"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_jitter_returns_base() {
        let base = Duration::from_secs(15);
        assert_eq!(jittered_delay(base, Duration::ZERO), base);
    }

    #[test]
    fn jitter_stays_within_bound() {
        let base = Duration::from_secs(15);
        let jitter = Duration::from_secs(6);
        for _ in 0..200 {
            let delay = jittered_delay(base, jitter);
            assert!(delay >= base);
            assert!(delay <= base + jitter);
        }
    }
}
