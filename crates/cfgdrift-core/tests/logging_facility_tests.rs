#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cfgdrift_core::errors::DriftError;
use cfgdrift_core::logging_facility::test_capture::init_test_capture;
use cfgdrift_core::model::VendorTag;
use cfgdrift_core::parser::ParseOptions;
use cfgdrift_core::{diff, log_op_end, log_op_error, log_op_start, parse};
use cfgdrift_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use common::*;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let events = capture.events();
    assert!(events
        .iter()
        .any(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)));
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1);
    assert_eq!(end_events[0].fields.get("duration_ms"), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = DriftError::UnknownVendor {
        vendor: VendorTag::Panos,
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let error_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(error_events.len(), 1);
    assert_eq!(
        error_events[0].fields.get("err_code"),
        Some(&"ERR_UNKNOWN_VENDOR".to_string())
    );
}

#[test]
fn test_parse_failure_logs_end_error_with_vendor() {
    let capture = init_test_capture();

    let result = parse(
        b"system {\n host-name logging-probe-7731;\n",
        VendorTag::Junos,
        at(1),
        &ParseOptions::default(),
    );
    assert!(result.is_err());

    let found = capture.count_events(|e| {
        e.op.as_deref() == Some("parse")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.fields.get("err_code").map(String::as_str) == Some("ERR_PARSE")
            && e.fields.get("vendor").map(String::as_str) == Some("junos")
    });
    assert!(found >= 1);
}

#[test]
fn test_raw_configuration_never_logged() {
    let capture = init_test_capture();
    let marker = "zz-unique-logging-marker-4419";
    let text = format!("hostname {}\nenable secret 0 {}\n", marker, marker);

    let t = parse_text(VendorTag::CiscoIos, &text);
    diff(&t, &t).unwrap();

    for event in capture.events() {
        for value in event.fields.values() {
            assert!(!value.contains(marker), "raw text leaked into {:?}", event);
        }
    }
}

#[test]
fn test_diff_logs_entry_count() {
    let capture = init_test_capture();
    let before = tree(VendorTag::Meraki, vec![leaf("logging-test-probe", "1")]);
    let after = tree(VendorTag::Meraki, vec![leaf("logging-test-probe", "2")]);

    diff(&before, &after).unwrap();

    let found = capture.count_events(|e| {
        e.op.as_deref() == Some("diff")
            && e.event.as_deref() == Some(EVENT_END)
            && e.fields.get("entry_count").map(String::as_str) == Some("1")
    });
    assert!(found >= 1);
}
