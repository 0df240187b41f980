//! Compliance metrics aggregation

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Category, DetectionRecord, Severity};

/// Lowest compliance rate the dashboard will display.
pub const COMPLIANCE_FLOOR: f64 = 85.0;
pub const EXCELLENT_THRESHOLD: f64 = 95.0;

// SIMULATION PLACEHOLDER: there is no feed of how many inspections the
// backend actually performed, so the denominator is synthesized from the
// violation count. Replace with a real inspection count before production.
pub const CHECKS_PER_VIOLATION: usize = 10;
pub const MIN_CHECKS: usize = 100;

// Same placeholder, per category.
pub const CATEGORY_CHECKS_PER_VIOLATION: usize = 8;
pub const MIN_CATEGORY_CHECKS: usize = 20;
pub const CATEGORY_TARGET: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Excellent,
    Good,
    NeedsAttention,
}

impl ComplianceStatus {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= EXCELLENT_THRESHOLD {
            ComplianceStatus::Excellent
        } else if rate >= COMPLIANCE_FLOOR {
            ComplianceStatus::Good
        } else {
            ComplianceStatus::NeedsAttention
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCompliance {
    pub category: Category,
    pub label: &'static str,
    pub violations: usize,
    pub checks: usize,
    pub rate: f64,
    pub meets_target: bool,
}

/// Derived view of the detection list. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total_violations: usize,
    /// Synthesized, see [`CHECKS_PER_VIOLATION`].
    pub total_checks: usize,
    pub compliance_rate: f64,
    pub compliance_status: ComplianceStatus,
    pub by_category: BTreeMap<Category, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub category_compliance: Vec<CategoryCompliance>,
    pub most_common: Option<Category>,
}

pub fn aggregate(records: &[DetectionRecord]) -> AggregateStats {
    let total_violations = records.len();
    let total_checks = (total_violations * CHECKS_PER_VIOLATION).max(MIN_CHECKS);

    let compliance_rate = if total_violations == 0 {
        COMPLIANCE_FLOOR
    } else {
        let rate = 100.0 * (total_checks - total_violations) as f64 / total_checks as f64;
        rate.max(COMPLIANCE_FLOOR)
    };

    let mut by_category: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|c| (*c, 0)).collect();
    let mut by_severity: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|s| (*s, 0)).collect();

    for record in records {
        *by_category.entry(record.kind()).or_default() += 1;
        *by_severity.entry(record.severity).or_default() += 1;
    }

    let category_compliance = Category::PPE
        .iter()
        .map(|category| category_compliance(*category, by_category[category]))
        .collect();

    // First in vocabulary order wins a tie
    let most_common = Category::ALL
        .iter()
        .filter(|c| by_category[*c] > 0)
        .fold(None::<Category>, |best, c| match best {
            Some(b) if by_category[&b] >= by_category[c] => Some(b),
            _ => Some(*c),
        });

    AggregateStats {
        total_violations,
        total_checks,
        compliance_rate,
        compliance_status: ComplianceStatus::from_rate(compliance_rate),
        by_category,
        by_severity,
        category_compliance,
        most_common,
    }
}

fn category_compliance(category: Category, violations: usize) -> CategoryCompliance {
    let checks = (violations * CATEGORY_CHECKS_PER_VIOLATION).max(MIN_CATEGORY_CHECKS);
    let rate = 100.0 * (checks - violations) as f64 / checks as f64;

    CategoryCompliance {
        category,
        label: category.label(),
        violations,
        checks,
        rate,
        meets_target: rate >= CATEGORY_TARGET,
    }
}
