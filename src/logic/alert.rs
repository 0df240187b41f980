//! Alert dispatch
//!
//! Decides whether the freshest detection deserves a notification. At most
//! one notification per polling cycle, never two for the same record.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{category_label, DetectionRecord, Notification};

pub const DEFAULT_FRESHNESS_SECS: i64 = 10;

/// Something that can make a noise when an alert fires.
pub trait AudioCue: Send + Sync {
    fn play(&self) -> std::io::Result<()>;
}

/// Rings the terminal bell on stderr.
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self) -> std::io::Result<()> {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07")?;
        stderr.flush()
    }
}

pub struct Silent;

impl AudioCue for Silent {
    fn play(&self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Play the cue; failures are only logged.
pub fn play_cue(cue: &dyn AudioCue) {
    if let Err(e) = cue.play() {
        tracing::debug!("Audio cue failed: {}", e);
    }
}

#[derive(Debug)]
pub struct AlertDispatcher {
    freshness: Duration,
    last_notified: Option<String>,
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_SECS)
    }
}

impl AlertDispatcher {
    pub fn new(freshness_secs: i64) -> Self {
        Self {
            freshness: Duration::seconds(freshness_secs.max(0)),
            last_notified: None,
        }
    }

    pub fn last_notified(&self) -> Option<&str> {
        self.last_notified.as_deref()
    }

    /// Inspect the newest record and return a notification if it is fresh,
    /// monitoring is on, and it has not been notified before.
    pub fn check(
        &mut self,
        records: &[DetectionRecord],
        monitoring: bool,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        if !monitoring {
            return None;
        }

        let newest = records.iter().max_by_key(|r| r.timestamp)?;

        if now.signed_duration_since(newest.timestamp) > self.freshness {
            return None;
        }
        if self.last_notified.as_deref() == Some(newest.id.as_str()) {
            return None;
        }

        self.last_notified = Some(newest.id.clone());
        Some(build_notification(newest, now))
    }
}

pub fn build_notification(record: &DetectionRecord, now: DateTime<Utc>) -> Notification {
    let kind = record.kind();
    let label = category_label(&record.category);

    let title = if kind.is_hazard() {
        "Fire/Smoke Alert"
    } else {
        "PPE Violation Detected"
    };

    let confidence_pct = record.confidence.map(|c| format!("{:.1}%", c * 100.0));

    let mut description = format!(
        "{} violation detected at {}",
        record.category.replace('_', " ").to_uppercase(),
        record.timestamp.format("%H:%M:%S")
    );
    if let Some(pct) = &confidence_pct {
        description.push_str(&format!(" (confidence {})", pct));
    }

    Notification {
        id: Uuid::new_v4(),
        record_id: record.id.clone(),
        title: title.to_string(),
        description,
        category_label: label,
        confidence_pct,
        severity: record.severity,
        created_at: now,
    }
}
