//! Compliance metrics and chart handlers

use axum::{extract::State, Json};

use crate::AppState;
use crate::logic::chart::{self, CategoryShare, HourlyView};
use crate::logic::metrics::{self, AggregateStats};

/// Compliance overview
pub async fn summary(State(state): State<AppState>) -> Json<AggregateStats> {
    Json(metrics::aggregate(&state.dashboard.records()))
}

/// Violation trends, last 12 hours
pub async fn hourly(State(state): State<AppState>) -> Json<HourlyView> {
    Json(chart::hourly_view(&state.dashboard.records()))
}

/// Violation type distribution
pub async fn distribution(State(state): State<AppState>) -> Json<Vec<CategoryShare>> {
    Json(chart::category_distribution(&state.dashboard.records()))
}
