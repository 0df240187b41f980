//! Configuration module

use std::env;
use std::time::Duration;

use crate::source::SourceKind;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Detection backend base URL (serves /live, /detections, /stats, /test_audio)
    pub backend_url: String,

    /// Which data source feeds the dashboard
    pub source: SourceKind,

    /// Seconds between polls while monitoring
    pub poll_interval_secs: u64,

    /// Timeout for a single backend request
    pub request_timeout_secs: u64,

    /// Upper bound for the failure backoff delay
    pub max_backoff_secs: u64,

    /// Capacity of the in-memory detection list
    pub max_records: usize,

    /// A record younger than this may raise an alert
    pub alert_freshness_secs: i64,

    /// Ring the terminal bell on alerts
    pub audio_cue: bool,

    /// Chance that a simulated poll yields a violation
    pub sim_violation_probability: f64,

    /// Location label used by the simulator
    pub sim_location: String,

    /// Start monitoring as soon as the server is up
    pub auto_start: bool,

    /// Emit JSON logs instead of the human-readable format
    pub json_logs: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            backend_url: "http://localhost:8000".to_string(),
            source: SourceKind::Simulated,
            poll_interval_secs: 5,
            request_timeout_secs: 5,
            max_backoff_secs: 60,
            max_records: 50,
            alert_freshness_secs: 10,
            audio_cue: true,
            sim_violation_probability: 0.1,
            sim_location: "Production Unit A".to_string(),
            auto_start: false,
            json_logs: false,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),

            backend_url: env::var("BACKEND_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),

            source: env::var("DATA_SOURCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.source),

            poll_interval_secs: parse_var("POLL_INTERVAL_SECS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.poll_interval_secs),

            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.request_timeout_secs),

            max_backoff_secs: parse_var("MAX_BACKOFF_SECS").unwrap_or(defaults.max_backoff_secs),

            max_records: parse_var("MAX_RECORDS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_records),

            alert_freshness_secs: parse_var("ALERT_FRESHNESS_SECS")
                .unwrap_or(defaults.alert_freshness_secs),

            audio_cue: flag_var("AUDIO_CUE").unwrap_or(defaults.audio_cue),

            sim_violation_probability: parse_var::<f64>("SIM_VIOLATION_PROBABILITY")
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(defaults.sim_violation_probability),

            sim_location: env::var("SIM_LOCATION").unwrap_or(defaults.sim_location),

            auto_start: flag_var("AUTO_START").unwrap_or(defaults.auto_start),

            json_logs: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logs),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs.max(self.poll_interval_secs))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn flag_var(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|s| s.to_lowercase() != "false" && s != "0")
}
