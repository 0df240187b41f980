//! Backend counters model

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Keys the backend has been seen to use for its overall detection count.
const TOTAL_KEYS: [&str; 4] = ["total", "total_detections", "totalDetections", "detections"];

/// Counters reported by the backend's `/stats` endpoint.
///
/// The shape is owned by the backend, so the raw object is kept as-is and
/// only the overall total is picked out for comparison with local figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStats {
    pub raw: serde_json::Value,
    pub total: Option<u64>,
    pub fetched_at: DateTime<Utc>,
}

impl BackendStats {
    pub fn from_value(raw: serde_json::Value, fetched_at: DateTime<Utc>) -> Self {
        let total = TOTAL_KEYS
            .iter()
            .find_map(|key| raw.get(*key).and_then(|v| v.as_u64()));

        Self { raw, total, fetched_at }
    }
}
