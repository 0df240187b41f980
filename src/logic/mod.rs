//! Dashboard logic: everything derived from the detection list.
//!
//! All of these are pure transforms over a slice of records except the
//! alert dispatcher, which remembers the last record it notified about.

pub mod alert;
pub mod chart;
pub mod logs;
pub mod metrics;
