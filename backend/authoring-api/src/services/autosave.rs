use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::services::AppState;

/// Autosave retry loop. Autosave writes are best effort: a failure is
/// logged and the draft stays staged on its session, then gets
/// re-attempted here on the next tick.
pub async fn run_autosave_loop(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.autosave_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        period_secs = period.as_secs(),
        "Autosave retry worker started"
    );

    loop {
        ticker.tick().await;
        let flushed = state.activity_service().flush_pending_autosaves().await;
        if flushed > 0 {
            tracing::debug!(flushed, "Flushed staged autosave drafts");
        }
    }
}
