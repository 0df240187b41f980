//! Alert feed handler

use axum::{extract::State, Json};

use crate::AppState;
use crate::models::Notification;

/// Recent notifications, newest first
pub async fn list(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.dashboard.notifications())
}
