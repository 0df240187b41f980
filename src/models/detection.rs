//! Detection record model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed event, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub location: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_ref: Option<String>,
}

impl DetectionRecord {
    /// Vocabulary entry this record is counted under.
    pub fn kind(&self) -> Category {
        Category::classify(&self.category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "critical" => Ok(Severity::High),
            "medium" | "moderate" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Fixed category vocabulary shared by metrics, charts and log filters.
///
/// Anything outside the vocabulary lands in [`Category::Other`] so tallies
/// always add up to the number of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NoHelmet,
    NoVest,
    NoShoes,
    NoGloves,
    Fire,
    Smoke,
    Other,
}

impl Category {
    /// Vocabulary order; also the tie-break order for "most common".
    pub const ALL: [Category; 7] = [
        Category::NoHelmet,
        Category::NoVest,
        Category::NoShoes,
        Category::NoGloves,
        Category::Fire,
        Category::Smoke,
        Category::Other,
    ];

    /// The PPE subset the simulator draws from.
    pub const PPE: [Category; 4] = [
        Category::NoHelmet,
        Category::NoVest,
        Category::NoShoes,
        Category::NoGloves,
    ];

    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "no_helmet" => Category::NoHelmet,
            "no_vest" => Category::NoVest,
            "no_shoes" => Category::NoShoes,
            "no_gloves" => Category::NoGloves,
            "fire" => Category::Fire,
            "smoke" => Category::Smoke,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NoHelmet => "no_helmet",
            Category::NoVest => "no_vest",
            Category::NoShoes => "no_shoes",
            Category::NoGloves => "no_gloves",
            Category::Fire => "fire",
            Category::Smoke => "smoke",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::NoHelmet => "Helmet",
            Category::NoVest => "Vest",
            Category::NoShoes => "Shoes",
            Category::NoGloves => "Gloves",
            Category::Fire => "Fire",
            Category::Smoke => "Smoke",
            Category::Other => "Other",
        }
    }

    pub fn is_hazard(&self) -> bool {
        matches!(self, Category::Fire | Category::Smoke)
    }

    /// Used when the backend omits or garbles the severity.
    pub fn default_severity(&self) -> Severity {
        match self {
            Category::Fire => Severity::High,
            _ => Severity::Medium,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::NoHelmet => "#EF4444",
            Category::NoVest => "#F97316",
            Category::NoShoes => "#EAB308",
            Category::NoGloves => "#8B5CF6",
            Category::Fire => "#DC2626",
            Category::Smoke => "#6B7280",
            Category::Other => "#9CA3AF",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable label for a raw category string.
///
/// Known categories use their vocabulary label, anything else is title-cased
/// (`"forklift_zone"` -> `"Forklift Zone"`).
pub fn category_label(raw: &str) -> String {
    match Category::classify(raw) {
        Category::Other => raw
            .trim()
            .trim_start_matches("no_")
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        known => known.label().to_string(),
    }
}
