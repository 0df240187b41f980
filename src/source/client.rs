//! Detection Backend Client
//!
//! HTTP client for the external video-analysis backend. Every call is
//! bounded by a timeout and every failure comes back as a [`FetchError`].

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::models::{BackendStats, Category, DetectionRecord, Severity};

/// Location used when the backend does not say where a detection happened.
pub const DEFAULT_LOCATION: &str = "Production Unit A";

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Detection backend client
#[derive(Debug, Clone)]
pub struct DetectionClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

/// `/detections` either returns a bare array or wraps it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionsPayload {
    List(Vec<Value>),
    Wrapped { detections: Vec<Value> },
}

/// One backend entry before normalization.
#[derive(Debug, Deserialize)]
struct RawDetection {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "time", alias = "created_at")]
    timestamp: Option<Value>,
    #[serde(default, alias = "class", alias = "label", alias = "type", alias = "violationType")]
    category: Option<String>,
    #[serde(default, alias = "detector")]
    source: Option<String>,
    #[serde(default, alias = "camera")]
    location: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default, alias = "score")]
    confidence: Option<f64>,
    #[serde(default, alias = "snapshot", alias = "snapshot_url", alias = "image")]
    snapshot_ref: Option<String>,
}

impl DetectionClient {
    /// Create new backend client
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, http_client })
    }

    /// URL of the multipart image stream, consumed by the live-view renderer
    pub fn live_feed_url(&self) -> String {
        format!("{}/live", self.config.base_url)
    }

    /// Fetch and normalize the backend's current detections
    pub async fn poll(&self) -> Result<Vec<DetectionRecord>, FetchError> {
        let body = self.get_bytes("/detections").await?;
        parse_detections(&body)
    }

    /// Fetch the backend's own counters
    pub async fn fetch_stats(&self) -> Result<BackendStats, FetchError> {
        let body = self.get_bytes("/stats").await?;
        let raw: Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        Ok(BackendStats::from_value(raw, Utc::now()))
    }

    /// Ask the backend to play its diagnostic sound
    pub async fn trigger_test_audio(&self) -> Result<(), FetchError> {
        self.get_bytes("/test_audio").await.map(|_| ())
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::BackendError(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

/// Normalize a `/detections` body into records.
///
/// A body that is not a JSON array (bare or wrapped) is malformed. Entries
/// without a usable timestamp or category are skipped.
pub fn parse_detections(body: &[u8]) -> Result<Vec<DetectionRecord>, FetchError> {
    let payload: DetectionsPayload = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let entries = match payload {
        DetectionsPayload::List(entries) => entries,
        DetectionsPayload::Wrapped { detections } => detections,
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = match serde_json::from_value::<RawDetection>(entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping undecodable detection entry: {}", e);
                continue;
            }
        };

        match normalize(raw) {
            Some(record) => records.push(record),
            None => tracing::warn!("Skipping detection entry without timestamp or category"),
        }
    }

    Ok(records)
}

fn normalize(raw: RawDetection) -> Option<DetectionRecord> {
    let timestamp = raw.timestamp.as_ref().and_then(parse_timestamp)?;

    let category = raw.category
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())?;

    let location = raw.location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let severity = raw.severity
        .as_deref()
        .and_then(|s| s.parse::<Severity>().ok())
        .unwrap_or_else(|| Category::classify(&category).default_severity());

    let id = match raw.id {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("{}-{}-{}", timestamp.timestamp_millis(), category, location),
    };

    Some(DetectionRecord {
        id,
        timestamp,
        category,
        source: raw.source.filter(|s| !s.is_empty()),
        location,
        severity,
        confidence: raw.confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0)),
        snapshot_ref: raw.snapshot_ref.filter(|s| !s.is_empty()),
    })
}

/// RFC 3339, naive ISO-8601 (taken as UTC), or unix seconds/millis.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => {
            let secs = n.as_f64()?;
            // Anything this large is already in milliseconds
            let millis = if secs > 1e12 { secs } else { secs * 1000.0 };
            DateTime::from_timestamp_millis(millis as i64)
        }
        _ => None,
    }
}
