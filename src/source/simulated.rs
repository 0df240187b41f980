//! Simulated detection generator
//!
//! Produces PPE violations at random so the dashboard can be exercised
//! without a detection backend. Non-deterministic by nature; nothing on the
//! aggregation or chart path calls into it.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::models::{Category, DetectionRecord, Severity};

/// Share of simulated violations marked high severity.
const HIGH_SEVERITY_SHARE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct SimulatedGenerator {
    violation_probability: f64,
    location: String,
}

impl SimulatedGenerator {
    pub fn new(violation_probability: f64, location: impl Into<String>) -> Self {
        Self {
            violation_probability: if violation_probability.is_finite() {
                violation_probability.clamp(0.0, 1.0)
            } else {
                0.0
            },
            location: location.into(),
        }
    }

    /// One polling cycle's worth of records (zero or one).
    pub fn generate(&self) -> Vec<DetectionRecord> {
        self.generate_with(&mut rand::thread_rng(), Utc::now())
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R, now: DateTime<Utc>) -> Vec<DetectionRecord> {
        if !rng.gen_bool(self.violation_probability) {
            return Vec::new();
        }

        let category = Category::PPE
            .choose(rng)
            .copied()
            .unwrap_or(Category::NoHelmet);

        let severity = if rng.gen_bool(HIGH_SEVERITY_SHARE) {
            Severity::High
        } else {
            Severity::Medium
        };

        vec![DetectionRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            category: category.as_str().to_string(),
            source: None,
            location: self.location.clone(),
            severity,
            confidence: None,
            snapshot_ref: None,
        }]
    }
}
