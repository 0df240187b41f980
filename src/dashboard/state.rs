//! Shell state machine
//!
//! `Idle -> Polling -> Idle`. Each poll carries a ticket; a result is only
//! applied while its session is still running and no newer poll has been
//! issued, so a slow response can never overwrite a fresher one.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;

use crate::error::FetchError;
use crate::logic::alert::AlertDispatcher;
use crate::models::{BackendStats, DetectionRecord, Notification};

pub const MAX_NOTIFICATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Unknown,
    Online,
    Offline,
}

/// Non-fatal error shown above the dashboard until the next good poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    pub session: u64,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { added: usize },
    Failed,
    /// Monitoring stopped or a newer poll was issued meanwhile.
    Discarded,
}

#[derive(Debug)]
pub(crate) struct ShellState {
    pub mode: MonitorState,
    pub session: u64,
    pub issued: u64,
    pub records: Vec<DetectionRecord>,
    pub connection: ConnectionStatus,
    pub banner: Option<Banner>,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub notifications: VecDeque<Notification>,
    pub backend_stats: Option<BackendStats>,
    pub dispatcher: AlertDispatcher,
    pub stop_signal: Option<Arc<Notify>>,
}

impl ShellState {
    pub fn new(dispatcher: AlertDispatcher) -> Self {
        Self {
            mode: MonitorState::Idle,
            session: 0,
            issued: 0,
            records: Vec::new(),
            connection: ConnectionStatus::Unknown,
            banner: None,
            last_poll_at: None,
            consecutive_failures: 0,
            notifications: VecDeque::with_capacity(MAX_NOTIFICATIONS),
            backend_stats: None,
            dispatcher,
            stop_signal: None,
        }
    }

    /// Enter `Polling`. Returns the new session and its stop signal, or
    /// `None` if already polling.
    pub fn start(&mut self) -> Option<(u64, Arc<Notify>)> {
        if self.mode == MonitorState::Polling {
            return None;
        }

        self.mode = MonitorState::Polling;
        self.session += 1;
        self.consecutive_failures = 0;

        let stop = Arc::new(Notify::new());
        self.stop_signal = Some(stop.clone());
        Some((self.session, stop))
    }

    /// Enter `Idle`. Returns the stop signal of the session that ended.
    pub fn stop(&mut self) -> Option<Arc<Notify>> {
        if self.mode == MonitorState::Idle {
            return None;
        }

        self.mode = MonitorState::Idle;
        self.stop_signal.take()
    }

    pub fn is_active(&self, session: u64) -> bool {
        self.mode == MonitorState::Polling && self.session == session
    }

    pub fn issue(&mut self) -> Option<PollTicket> {
        if self.mode != MonitorState::Polling {
            return None;
        }

        self.issued += 1;
        Some(PollTicket {
            session: self.session,
            generation: self.issued,
        })
    }

    pub fn apply(
        &mut self,
        ticket: PollTicket,
        result: Result<Vec<DetectionRecord>, FetchError>,
        capacity: usize,
        now: DateTime<Utc>,
    ) -> ApplyOutcome {
        if !self.is_active(ticket.session) || ticket.generation != self.issued {
            return ApplyOutcome::Discarded;
        }

        self.last_poll_at = Some(now);

        match result {
            Ok(incoming) => {
                let (records, added) = merge_records(&self.records, incoming, capacity);
                self.records = records;
                self.connection = ConnectionStatus::Online;
                self.banner = None;
                self.consecutive_failures = 0;
                ApplyOutcome::Applied { added }
            }
            Err(e) => {
                self.connection = ConnectionStatus::Offline;
                self.banner = Some(Banner {
                    message: e.to_string(),
                    at: now,
                });
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                ApplyOutcome::Failed
            }
        }
    }

    pub fn push_notification(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_back();
        }
        self.notifications.push_front(notification);
    }
}

/// Add records with unseen ids, newest first, keep at most `capacity`.
///
/// Builds a new list so readers never observe a half-merged one.
pub fn merge_records(
    current: &[DetectionRecord],
    incoming: Vec<DetectionRecord>,
    capacity: usize,
) -> (Vec<DetectionRecord>, usize) {
    let mut merged = current.to_vec();

    for record in incoming {
        if merged.iter().any(|r| r.id == record.id) {
            continue;
        }
        merged.push(record);
    }

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(capacity);

    // Only count records that survived the cap
    let added = merged
        .iter()
        .filter(|r| !current.iter().any(|c| c.id == r.id))
        .count();
    (merged, added)
}
