//! Hourly chart projection
//!
//! Hours are taken in UTC. Nothing here reads the clock or a random source,
//! so the same records always project to the same output.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::Serialize;

use crate::models::{Category, DetectionRecord};

pub const HOURS_PER_DAY: usize = 24;
pub const RECENT_WINDOW: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub label: String,
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
}

impl HourBucket {
    fn empty(hour: u32) -> Self {
        Self {
            hour,
            label: format!("{:02}:00", hour),
            total: 0,
            by_category: Category::ALL.iter().map(|c| (*c, 0)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyView {
    pub end_hour: u32,
    pub buckets: Vec<HourBucket>,
    pub peak: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub name: &'static str,
    pub value: usize,
    pub share_pct: f64,
    pub color: &'static str,
}

pub fn bucket_by_hour(records: &[DetectionRecord]) -> [HourBucket; HOURS_PER_DAY] {
    let mut buckets: [HourBucket; HOURS_PER_DAY] =
        std::array::from_fn(|h| HourBucket::empty(h as u32));

    for record in records {
        let bucket = &mut buckets[record.timestamp.hour() as usize];
        bucket.total += 1;
        *bucket.by_category.entry(record.kind()).or_default() += 1;
    }

    buckets
}

/// The [`RECENT_WINDOW`] consecutive hours ending at `end_hour`, wrapping
/// past midnight.
pub fn recent_window(buckets: &[HourBucket; HOURS_PER_DAY], end_hour: u32) -> Vec<HourBucket> {
    let end = end_hour as usize % HOURS_PER_DAY;
    (0..RECENT_WINDOW)
        .map(|i| {
            let hour = (end + HOURS_PER_DAY + 1 + i - RECENT_WINDOW) % HOURS_PER_DAY;
            buckets[hour].clone()
        })
        .collect()
}

/// Primary chart: the window ends at the newest record's hour, or at 23:00
/// when there are no records.
pub fn hourly_view(records: &[DetectionRecord]) -> HourlyView {
    let buckets = bucket_by_hour(records);
    let end_hour = records
        .iter()
        .map(|r| r.timestamp)
        .max()
        .map(|ts| ts.hour())
        .unwrap_or(HOURS_PER_DAY as u32 - 1);

    HourlyView {
        end_hour,
        peak: peak_hour(&buckets).map(|b| {
            format!("{} - {:02}:00", b.label, (b.hour + 1) % HOURS_PER_DAY as u32)
        }),
        buckets: recent_window(&buckets, end_hour),
    }
}

/// Busiest hour, earliest on a tie. `None` when every bucket is empty.
pub fn peak_hour(buckets: &[HourBucket]) -> Option<&HourBucket> {
    buckets
        .iter()
        .filter(|b| b.total > 0)
        .fold(None, |best: Option<&HourBucket>, b| match best {
            Some(p) if p.total >= b.total => Some(p),
            _ => Some(b),
        })
}

pub fn category_distribution(records: &[DetectionRecord]) -> Vec<CategoryShare> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.kind()).or_default() += 1;
    }

    let total = records.len();
    Category::ALL
        .iter()
        .map(|category| {
            let value = counts.get(category).copied().unwrap_or(0);
            CategoryShare {
                category: *category,
                name: category.label(),
                value,
                share_pct: if total == 0 { 0.0 } else { 100.0 * value as f64 / total as f64 },
                color: category.color(),
            }
        })
        .collect()
}
