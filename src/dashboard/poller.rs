//! Monitoring timer loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use super::Dashboard;
use crate::source::SourceKind;

/// Polls once immediately, then keeps polling until the session ends.
pub(super) async fn run(dashboard: Arc<Dashboard>, session: u64, stop: Arc<Notify>) {
    tracing::debug!(session, "Poll loop started");

    loop {
        if !dashboard.is_session_active(session) {
            break;
        }

        dashboard.poll_once().await;
        if dashboard.source_kind() == SourceKind::Live {
            dashboard.refresh_backend_stats().await;
        }

        if !dashboard.is_session_active(session) {
            break;
        }

        let delay = backoff_delay(
            dashboard.poll_interval(),
            dashboard.consecutive_failures(),
            dashboard.max_backoff(),
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop.notified() => break,
        }
    }

    tracing::debug!(session, "Poll loop exited");
}

/// `base * 2^failures`, capped at `max`.
pub fn backoff_delay(base: Duration, failures: u32, max: Duration) -> Duration {
    let factor = 1u32.checked_shl(failures.min(16)).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(max).min(max.max(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_secs(5);
        let max = Duration::from_secs(60);

        assert_eq!(backoff_delay(base, 0, max), Duration::from_secs(5));
        assert_eq!(backoff_delay(base, 1, max), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 3, max), Duration::from_secs(40));
        assert_eq!(backoff_delay(base, 4, max), Duration::from_secs(60));
        assert_eq!(backoff_delay(base, 1000, max), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_never_below_base() {
        let base = Duration::from_secs(5);
        assert_eq!(backoff_delay(base, 0, Duration::from_secs(1)), base);
    }
}
