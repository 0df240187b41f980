//! Alert notification model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Severity;

/// User-visible alert raised for a fresh detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub record_id: String,
    pub title: String,
    pub description: String,
    pub category_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_pct: Option<String>,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}
