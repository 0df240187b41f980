//! Violation log filtering and CSV export

use chrono::{NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Category, DetectionRecord, Severity};

/// Filter value that disables a severity or category filter.
pub const MATCH_ALL: &str = "all";

pub const CSV_HEADER: [&str; 4] = ["Timestamp", "Violation Type", "Location", "Severity"];

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LogFilter {
    /// Case-insensitive substring of category or location
    #[validate(length(max = 200))]
    pub text: Option<String>,
    #[validate(length(max = 32))]
    pub severity: Option<String>,
    #[validate(length(max = 64))]
    pub category: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, record: &DetectionRecord) -> bool {
        let text_ok = match self.text.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                record.category.to_lowercase().contains(&needle)
                    || record.location.to_lowercase().contains(&needle)
            }
        };

        let severity_ok = match active(&self.severity) {
            None => true,
            Some(wanted) => record.severity.as_str() == wanted.to_lowercase(),
        };

        let category_ok = match active(&self.category) {
            None => true,
            Some(wanted) => match vocabulary_entry(wanted) {
                Some(kind) => record.kind() == kind,
                None => record.category == wanted,
            },
        };

        text_ok && severity_ok && category_ok
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(MATCH_ALL))
}

/// Vocabulary entry named exactly by a filter value, if any.
fn vocabulary_entry(value: &str) -> Option<Category> {
    Category::ALL
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(value))
}

pub fn filter(records: &[DetectionRecord], filter: &LogFilter) -> Vec<DetectionRecord> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// Filtered log table plus its summary counters.
#[derive(Debug, Clone, Serialize)]
pub struct LogView {
    pub total: usize,
    pub matched: usize,
    pub high_priority: usize,
    pub filtered_out_pct: f64,
    pub records: Vec<DetectionRecord>,
}

pub fn log_view(records: &[DetectionRecord], log_filter: &LogFilter) -> LogView {
    let matched = filter(records, log_filter);
    let total = records.len();

    LogView {
        total,
        matched: matched.len(),
        high_priority: matched.iter().filter(|r| r.severity == Severity::High).count(),
        filtered_out_pct: if total == 0 {
            0.0
        } else {
            100.0 * (total - matched.len()) as f64 / total as f64
        },
        records: matched,
    }
}

/// Render records as RFC 4180 CSV, in the order given.
pub fn export_csv(records: &[DetectionRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true).as_str(),
            record.category.as_str(),
            record.location.as_str(),
            record.severity.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("ppe_violations_{}.csv", date.format("%Y-%m-%d"))
}
