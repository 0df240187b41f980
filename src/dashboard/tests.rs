use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use super::state::merge_records;
use super::*;
use crate::config::Config;
use crate::logic::alert::Silent;
use crate::logic::metrics::{aggregate, COMPLIANCE_FLOOR};
use crate::models::Severity;
use crate::source::SimulatedGenerator;

fn record(id: &str, age_secs: i64) -> DetectionRecord {
    DetectionRecord {
        id: id.to_string(),
        timestamp: Utc::now() - ChronoDuration::seconds(age_secs),
        category: "no_helmet".to_string(),
        source: Some("PPE".to_string()),
        location: "Production Unit A".to_string(),
        severity: Severity::High,
        confidence: Some(0.9),
        snapshot_ref: None,
    }
}

fn dashboard_with(config: Config, probability: f64) -> Dashboard {
    let source = DataSource::Simulated(SimulatedGenerator::new(probability, "Bay 1"));
    Dashboard::new(source, &config, Box::new(Silent))
}

fn dashboard() -> Dashboard {
    dashboard_with(Config::default(), 0.0)
}

fn ids(records: &[DetectionRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_newer_poll_wins_over_slower_older_one() {
    let dash = dashboard();
    dash.activate().unwrap();

    let a = dash.begin_poll().unwrap();
    let b = dash.begin_poll().unwrap();

    assert!(matches!(
        dash.complete_poll(b, Ok(vec![record("from-b", 30)])),
        ApplyOutcome::Applied { added: 1 }
    ));
    assert_eq!(
        dash.complete_poll(a, Ok(vec![record("from-a", 31)])),
        ApplyOutcome::Discarded
    );

    assert_eq!(ids(&dash.records()), vec!["from-b"]);
}

#[test]
fn test_older_poll_is_discarded_even_if_newer_is_still_in_flight() {
    let dash = dashboard();
    dash.activate().unwrap();

    let a = dash.begin_poll().unwrap();
    let _b = dash.begin_poll().unwrap();

    assert_eq!(dash.complete_poll(a, Ok(vec![record("from-a", 30)])), ApplyOutcome::Discarded);
    assert!(dash.records().is_empty());
}

#[test]
fn test_stop_discards_in_flight_result() {
    let dash = dashboard();
    dash.activate().unwrap();

    let ticket = dash.begin_poll().unwrap();
    assert!(dash.stop());
    assert_eq!(dash.complete_poll(ticket, Ok(vec![record("late", 1)])), ApplyOutcome::Discarded);

    assert!(dash.records().is_empty());
    assert!(dash.notifications().is_empty());
    assert!(dash.begin_poll().is_none());
}

#[test]
fn test_previous_session_result_is_discarded_after_restart() {
    let dash = dashboard();
    dash.activate().unwrap();
    let old = dash.begin_poll().unwrap();

    dash.stop();
    dash.activate().unwrap();

    assert_eq!(dash.complete_poll(old, Ok(vec![record("old", 1)])), ApplyOutcome::Discarded);
}

#[test]
fn test_failure_keeps_previous_list_and_goes_offline() {
    let dash = dashboard();
    dash.activate().unwrap();

    let t = dash.begin_poll().unwrap();
    dash.complete_poll(t, Ok(vec![record("kept", 60)]));
    assert_eq!(dash.status().connection, ConnectionStatus::Online);

    let t = dash.begin_poll().unwrap();
    let outcome = dash.complete_poll(t, Err(FetchError::BackendError(503)));
    assert_eq!(outcome, ApplyOutcome::Failed);

    let status = dash.status();
    assert_eq!(ids(&dash.records()), vec!["kept"]);
    assert_eq!(status.connection, ConnectionStatus::Offline);
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.banner.unwrap().message.contains("503"));

    let t = dash.begin_poll().unwrap();
    dash.complete_poll(t, Ok(vec![]));
    let status = dash.status();
    assert_eq!(status.connection, ConnectionStatus::Online);
    assert!(status.banner.is_none());
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(ids(&dash.records()), vec!["kept"]);
}

#[test]
fn test_same_fresh_record_alerts_once_across_cycles() {
    let dash = dashboard();
    dash.activate().unwrap();

    let fresh = record("fresh", 1);
    for _ in 0..3 {
        let t = dash.begin_poll().unwrap();
        dash.complete_poll(t, Ok(vec![fresh.clone()]));
    }

    let notes = dash.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].record_id, "fresh");
    assert_eq!(notes[0].confidence_pct.as_deref(), Some("90.0%"));
}

#[test]
fn test_old_record_does_not_alert() {
    let dash = dashboard();
    dash.activate().unwrap();

    let t = dash.begin_poll().unwrap();
    dash.complete_poll(t, Ok(vec![record("old", 120)]));
    assert!(dash.notifications().is_empty());
}

#[test]
fn test_list_is_capped_keeping_newest() {
    let mut config = Config::default();
    config.max_records = 3;
    let dash = dashboard_with(config, 0.0);
    dash.activate().unwrap();

    let batch: Vec<_> = (0..5).map(|i| record(&format!("r{}", i), 100 + i)).collect();
    let t = dash.begin_poll().unwrap();
    dash.complete_poll(t, Ok(batch));

    assert_eq!(ids(&dash.records()), vec!["r0", "r1", "r2"]);
}

#[test]
fn test_merge_skips_known_ids() {
    let current = vec![record("a", 10)];
    let (merged, added) = merge_records(&current, vec![record("a", 10), record("b", 5)], 50);

    assert_eq!(added, 1);
    assert_eq!(ids(&merged), vec!["b", "a"]);
}

#[test]
fn test_merge_does_not_count_records_evicted_by_cap() {
    let current = vec![record("a", 1), record("b", 2)];
    let (merged, added) = merge_records(&current, vec![record("c", 30)], 2);

    assert_eq!(ids(&merged), vec!["a", "b"]);
    assert_eq!(added, 0);

    let (merged, added) = merge_records(&current, vec![record("d", 0), record("e", 40)], 2);
    assert_eq!(ids(&merged), vec!["d", "a"]);
    assert_eq!(added, 1);
}

#[test]
fn test_idle_dashboard_shows_floor_compliance() {
    let dash = dashboard();

    assert!(!dash.is_monitoring());
    let stats = aggregate(&dash.records());
    assert_eq!(stats.compliance_rate, COMPLIANCE_FLOOR);
    assert_eq!(stats.total_violations, 0);
}

#[tokio::test]
async fn test_retry_requires_monitoring() {
    let dash = dashboard();
    assert!(dash.retry().await.is_none());

    dash.activate().unwrap();
    assert!(matches!(dash.retry().await, Some(ApplyOutcome::Applied { added: 0 })));
}

#[tokio::test]
async fn test_start_polls_immediately_and_stop_is_idempotent() {
    let mut config = Config::default();
    config.poll_interval_secs = 60;
    let dash = Arc::new(dashboard_with(config, 1.0));

    assert!(dash.start());
    assert!(!dash.start());

    let mut waited = Duration::ZERO;
    while dash.records().is_empty() && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert_eq!(dash.records().len(), 1);
    assert_eq!(dash.status().state, MonitorState::Polling);

    assert!(dash.stop());
    assert!(!dash.stop());
    assert_eq!(dash.status().state, MonitorState::Idle);
}

#[tokio::test]
async fn test_simulated_test_audio_is_local() {
    let dash = dashboard();
    tokio_test::assert_ok!(dash.test_audio().await);
}
