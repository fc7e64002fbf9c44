#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cfgdrift_core::logging_facility::test_capture::init_test_capture;
use cfgdrift_core::model::VendorTag;
use cfgdrift_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use cfgdrift_engine::{run_batch, DeviceStatus, EngineConfig, Stage};
use common::*;

fn mixed_jobs() -> Vec<cfgdrift_engine::DeviceJob> {
    vec![
        ios_job("edge-c", EDGE_BEFORE, EDGE_AFTER_REORDER),
        job("core-b", VendorTag::Junos, JUNOS_OK, JUNOS_BROKEN),
        ios_job("edge-a", EDGE_BEFORE, EDGE_AFTER_VLAN),
        ios_job(
            "edge-d",
            "router bgp 65000\n",
            "router bgp 65000\n neighbor 192.0.2.9 remote-as 65001\n",
        ),
    ]
}

#[test]
fn test_failure_is_isolated_to_its_device() {
    let report = run_batch(&pipeline(EngineConfig::default()), &mixed_jobs()).unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.incomplete_rollbacks, 1);

    let failed = report.outcome("core-b").unwrap();
    assert!(matches!(
        failed.status,
        DeviceStatus::Failed { stage: Stage::ParseAfter, .. }
    ));
    assert!(report.outcome("edge-a").unwrap().is_success());
    assert!(report.outcome("edge-c").unwrap().is_success());
}

#[test]
fn test_outcomes_sorted_by_device_id() {
    let report = run_batch(&pipeline(EngineConfig::default()), &mixed_jobs()).unwrap();
    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.device_id.as_str()).collect();
    assert_eq!(ids, vec!["core-b", "edge-a", "edge-c", "edge-d"]);
}

#[test]
fn test_each_device_gets_its_own_request_id() {
    let report = run_batch(&pipeline(EngineConfig::default()), &mixed_jobs()).unwrap();
    let mut ids: Vec<&str> = report
        .outcomes
        .iter()
        .map(|o| o.request_id.as_str())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_worker_count_does_not_change_results() {
    let jobs = mixed_jobs();
    let single = run_batch(
        &pipeline(EngineConfig {
            worker_threads: 1,
            ..EngineConfig::default()
        }),
        &jobs,
    )
    .unwrap();
    let many = run_batch(
        &pipeline(EngineConfig {
            worker_threads: 4,
            ..EngineConfig::default()
        }),
        &jobs,
    )
    .unwrap();

    assert_eq!(single.outcomes.len(), many.outcomes.len());
    for (a, b) in single.outcomes.iter().zip(&many.outcomes) {
        assert_eq!(a.device_id, b.device_id);
        assert_eq!(a.status, b.status);
    }
}

#[test]
fn test_empty_batch() {
    let report = run_batch(&pipeline(EngineConfig::default()), &[]).unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.succeeded + report.failed, 0);
}

#[test]
fn test_batch_logs_device_and_batch_boundaries() {
    let capture = init_test_capture();
    let jobs = vec![
        ios_job("edge-log-1", EDGE_BEFORE, EDGE_AFTER_VLAN),
        job("core-log-2", VendorTag::Junos, JUNOS_BROKEN, JUNOS_OK),
    ];
    let report = run_batch(&pipeline(EngineConfig::default()), &jobs).unwrap();

    let device_failed = capture.count_events(|e| {
        e.op.as_deref() == Some("compare_device")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.fields.get("device_id").map(String::as_str) == Some("core-log-2")
            && e.fields.get("stage").map(String::as_str) == Some("parse_before")
    });
    assert!(device_failed >= 1);

    let trace = report.trace_id.as_str().to_string();
    let batch_end = capture.count_events(|e| {
        e.op.as_deref() == Some("run_batch")
            && e.event.as_deref() == Some(EVENT_END)
            && e.fields.get("trace_id") == Some(&trace)
    });
    assert_eq!(batch_end, 1);

    let device_starts = capture.count_events(|e| {
        e.op.as_deref() == Some("compare_device")
            && e.event.as_deref() == Some(EVENT_START)
            && e.fields.get("trace_id") == Some(&trace)
    });
    assert_eq!(device_starts, 2);
}
