//! Detection backend handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;
use crate::logic::metrics;
use crate::models::BackendStats;
use crate::source::SourceKind;

#[derive(Debug, Serialize)]
pub struct StatsComparison {
    pub source: SourceKind,
    pub backend: Option<BackendStats>,
    pub computed_total: usize,
    /// Backend total minus the locally computed total, when both exist
    pub discrepancy: Option<i64>,
}

/// Backend counters next to the locally computed figures
pub async fn stats(State(state): State<AppState>) -> Json<StatsComparison> {
    let backend = state.dashboard.backend_stats();
    let computed_total = metrics::aggregate(&state.dashboard.records()).total_violations;

    let discrepancy = backend
        .as_ref()
        .and_then(|b| b.total)
        .map(|total| total as i64 - computed_total as i64);

    Json(StatsComparison {
        source: state.dashboard.source_kind(),
        backend,
        computed_total,
        discrepancy,
    })
}

/// Fire-and-forget diagnostic sound
pub async fn test_audio(State(state): State<AppState>) -> StatusCode {
    let dashboard = state.dashboard.clone();
    tokio::spawn(async move {
        if let Err(e) = dashboard.test_audio().await {
            tracing::warn!("Test audio trigger failed: {}", e);
        }
    });

    StatusCode::ACCEPTED
}
