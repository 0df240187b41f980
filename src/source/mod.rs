//! Detection data sources
//!
//! The dashboard is fed either by the real backend or by the simulator. The
//! choice is made once at startup; the two are never mixed.

pub mod client;
pub mod simulated;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use client::{ClientConfig, DetectionClient};
pub use simulated::SimulatedGenerator;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{BackendStats, DetectionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Live,
    Simulated,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" | "backend" => Ok(SourceKind::Live),
            "simulated" | "simulation" | "sim" => Ok(SourceKind::Simulated),
            other => Err(format!("unknown data source: {}", other)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Live => f.write_str("live"),
            SourceKind::Simulated => f.write_str("simulated"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DataSource {
    Live(DetectionClient),
    Simulated(SimulatedGenerator),
}

impl DataSource {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(match config.source {
            SourceKind::Live => DataSource::Live(DetectionClient::new(ClientConfig {
                base_url: config.backend_url.clone(),
                timeout_seconds: config.request_timeout_secs,
            })?),
            SourceKind::Simulated => DataSource::Simulated(SimulatedGenerator::new(
                config.sim_violation_probability,
                config.sim_location.clone(),
            )),
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            DataSource::Live(_) => SourceKind::Live,
            DataSource::Simulated(_) => SourceKind::Simulated,
        }
    }

    pub async fn poll(&self) -> Result<Vec<DetectionRecord>, FetchError> {
        match self {
            DataSource::Live(client) => client.poll().await,
            DataSource::Simulated(generator) => Ok(generator.generate()),
        }
    }

    /// Backend counters; the simulator has none.
    pub async fn fetch_stats(&self) -> Option<Result<BackendStats, FetchError>> {
        match self {
            DataSource::Live(client) => Some(client.fetch_stats().await),
            DataSource::Simulated(_) => None,
        }
    }

    pub fn live_feed_url(&self) -> Option<String> {
        match self {
            DataSource::Live(client) => Some(client.live_feed_url()),
            DataSource::Simulated(_) => None,
        }
    }
}
