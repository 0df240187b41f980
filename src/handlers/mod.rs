//! HTTP handlers

pub mod health;
pub mod monitoring;
pub mod detections;
pub mod metrics;
pub mod logs;
pub mod alerts;
pub mod backend;
