//! Dashboard Shell
//!
//! Owns the monitoring lifecycle and the canonical detection list. Every
//! view (metrics, charts, logs, alerts) is derived from [`Dashboard::records`]
//! on read; nothing else holds a copy.

mod poller;
mod state;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Notify;

pub use state::{ApplyOutcome, Banner, ConnectionStatus, MonitorState, PollTicket};

use crate::config::Config;
use crate::error::FetchError;
use crate::logic::alert::{play_cue, AlertDispatcher, AudioCue};
use crate::models::{BackendStats, DetectionRecord, Notification};
use crate::source::{DataSource, SourceKind};
use state::ShellState;

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStatus {
    pub state: MonitorState,
    pub connection: ConnectionStatus,
    pub source: SourceKind,
    pub record_count: usize,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub banner: Option<Banner>,
    pub consecutive_failures: u32,
    pub poll_interval_secs: u64,
    pub live_feed_url: Option<String>,
}

pub struct Dashboard {
    state: RwLock<ShellState>,
    source: DataSource,
    audio: Box<dyn AudioCue>,
    poll_interval: Duration,
    max_backoff: Duration,
    max_records: usize,
}

impl Dashboard {
    pub fn new(source: DataSource, config: &Config, audio: Box<dyn AudioCue>) -> Self {
        Self {
            state: RwLock::new(ShellState::new(AlertDispatcher::new(config.alert_freshness_secs))),
            source,
            audio,
            poll_interval: config.poll_interval(),
            max_backoff: config.max_backoff(),
            max_records: config.max_records,
        }
    }

    /// Start monitoring: poll now, then on a timer. No-op if already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let Some((session, stop)) = self.activate() else {
            return false;
        };

        tracing::info!(session, source = %self.source.kind(), "Monitoring started");
        tokio::spawn(poller::run(Arc::clone(self), session, stop));
        true
    }

    /// Stop monitoring. In-flight polls finish but their results are dropped.
    pub fn stop(&self) -> bool {
        let stop = self.state.write().stop();
        match stop {
            Some(signal) => {
                signal.notify_one();
                tracing::info!("Monitoring stopped");
                true
            }
            None => false,
        }
    }

    pub(crate) fn activate(&self) -> Option<(u64, Arc<Notify>)> {
        self.state.write().start()
    }

    pub fn is_monitoring(&self) -> bool {
        self.state.read().mode == MonitorState::Polling
    }

    pub(crate) fn is_session_active(&self, session: u64) -> bool {
        self.state.read().is_active(session)
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.state.read().consecutive_failures
    }

    pub fn begin_poll(&self) -> Option<PollTicket> {
        self.state.write().issue()
    }

    /// Apply a finished poll and run alert dispatch on the result.
    pub fn complete_poll(
        &self,
        ticket: PollTicket,
        result: Result<Vec<DetectionRecord>, FetchError>,
    ) -> ApplyOutcome {
        let now = Utc::now();

        let (outcome, notification) = {
            let mut state = self.state.write();
            let outcome = state.apply(ticket, result, self.max_records, now);

            let notification = match outcome {
                ApplyOutcome::Applied { .. } => {
                    let monitoring = state.mode == MonitorState::Polling;
                    let ShellState { dispatcher, records, .. } = &mut *state;
                    let notification = dispatcher.check(records, monitoring, now);
                    if let Some(n) = &notification {
                        state.push_notification(n.clone());
                    }
                    notification
                }
                _ => None,
            };

            if let (ApplyOutcome::Failed, Some(banner)) = (outcome, &state.banner) {
                tracing::warn!(
                    failures = state.consecutive_failures,
                    "Detection poll failed: {}",
                    banner.message
                );
            }

            (outcome, notification)
        };

        match outcome {
            ApplyOutcome::Applied { added } if added > 0 => {
                tracing::debug!(generation = ticket.generation, added, "Detections applied");
            }
            ApplyOutcome::Discarded => {
                tracing::debug!(
                    session = ticket.session,
                    generation = ticket.generation,
                    "Discarded stale poll result"
                );
            }
            _ => {}
        }

        if let Some(n) = notification {
            tracing::warn!(record = %n.record_id, "{}: {}", n.title, n.description);
            play_cue(self.audio.as_ref());
        }

        outcome
    }

    /// One full poll cycle. `None` when not monitoring.
    pub async fn poll_once(&self) -> Option<ApplyOutcome> {
        let ticket = self.begin_poll()?;
        let result = self.source.poll().await;
        Some(self.complete_poll(ticket, result))
    }

    /// User-requested extra poll while monitoring.
    pub async fn retry(&self) -> Option<ApplyOutcome> {
        tracing::info!("Manual retry requested");
        self.poll_once().await
    }

    pub async fn refresh_backend_stats(&self) {
        match self.source.fetch_stats().await {
            Some(Ok(stats)) => self.state.write().backend_stats = Some(stats),
            Some(Err(e)) => tracing::debug!("Backend stats unavailable: {}", e),
            None => {}
        }
    }

    /// Diagnostic sound: backend trigger when live, local cue when simulated.
    pub async fn test_audio(&self) -> Result<(), FetchError> {
        match &self.source {
            DataSource::Live(client) => client.trigger_test_audio().await,
            DataSource::Simulated(_) => {
                play_cue(self.audio.as_ref());
                Ok(())
            }
        }
    }

    pub fn records(&self) -> Vec<DetectionRecord> {
        self.state.read().records.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.read().notifications.iter().cloned().collect()
    }

    pub fn backend_stats(&self) -> Option<BackendStats> {
        self.state.read().backend_stats.clone()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    pub fn status(&self) -> MonitoringStatus {
        let state = self.state.read();
        MonitoringStatus {
            state: state.mode,
            connection: state.connection,
            source: self.source.kind(),
            record_count: state.records.len(),
            last_poll_at: state.last_poll_at,
            banner: state.banner.clone(),
            consecutive_failures: state.consecutive_failures,
            poll_interval_secs: self.poll_interval.as_secs(),
            live_feed_url: self.source.live_feed_url(),
        }
    }
}
