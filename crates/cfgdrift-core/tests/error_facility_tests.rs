#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cfgdrift_core::config::DiffLimits;
use cfgdrift_core::errors::{DriftError, ExError, ExErrorKind};
use cfgdrift_core::model::VendorTag;
use cfgdrift_core::{diff, diff_with_limits};
use cfgdrift_core_types::RequestId;
use common::*;

#[test]
fn test_incompatible_trees_verifiable_by_kind() {
    let before = tree(VendorTag::CiscoIos, vec![]);
    let after = tree(VendorTag::Junos, vec![]);
    let ex: ExError = diff(&before, &after).unwrap_err().into();

    assert_eq!(ex.kind(), ExErrorKind::IncompatibleTrees);
    assert_eq!(ex.code(), "ERR_INCOMPATIBLE_TREES");
    assert_eq!(ex.vendor(), Some(VendorTag::CiscoIos));
    assert!(ex.message().contains("junos"));
}

#[test]
fn test_depth_exceeded_carries_path() {
    let before = ios_tree(vec![map("a", vec![map("b", vec![leaf("c", "1")])])]);
    let after = ios_tree(vec![map("a", vec![map("b", vec![leaf("c", "2")])])]);
    let err = diff_with_limits(&before, &after, &DiffLimits::default().with_max_depth(2))
        .unwrap_err();
    let ex: ExError = err.into();

    assert_eq!(ex.kind(), ExErrorKind::DepthExceeded);
    assert_eq!(ex.path(), Some(&path(&["a", "b", "c"])));
}

#[test]
fn test_unsynthesizable_distinct_from_apply_conflict() {
    let unsynth: ExError = DriftError::Unsynthesizable {
        path: path(&["snmp-server"]),
        reason: "node kind changed".to_string(),
    }
    .into();
    let conflict: ExError = DriftError::ApplyConflict {
        path: path(&["snmp-server"]),
        reason: "nothing to remove".to_string(),
    }
    .into();

    assert_eq!(unsynth.code(), "ERR_UNSYNTHESIZABLE_CHANGE");
    assert_eq!(conflict.code(), "ERR_APPLY_CONFLICT");
    assert_ne!(unsynth.kind(), conflict.kind());
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::ParseError, "ERR_PARSE"),
        (ExErrorKind::UnknownVendor, "ERR_UNKNOWN_VENDOR"),
        (ExErrorKind::IncompatibleTrees, "ERR_INCOMPATIBLE_TREES"),
        (ExErrorKind::DepthExceeded, "ERR_DEPTH_EXCEEDED"),
        (ExErrorKind::ListLimitExceeded, "ERR_LIST_LIMIT_EXCEEDED"),
        (ExErrorKind::UnsynthesizableChange, "ERR_UNSYNTHESIZABLE_CHANGE"),
        (ExErrorKind::ApplyConflict, "ERR_APPLY_CONFLICT"),
        (ExErrorKind::InvalidSchemaTable, "ERR_INVALID_SCHEMA_TABLE"),
        (ExErrorKind::InvalidConfig, "ERR_INVALID_CONFIG"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_device_context_survives_conversion() {
    let request_id = RequestId::new();
    let ex: ExError = DriftError::Parse {
        vendor: VendorTag::F5Bigip,
        offset: 118,
        reason: "unterminated quoted string".to_string(),
    }
    .into();
    let ex = ex
        .with_op("parse_before")
        .with_device_id("lb-dc1-01")
        .with_request_id(request_id.clone());

    assert_eq!(ex.device_id(), Some("lb-dc1-01"));
    assert_eq!(ex.request_id(), Some(&request_id));
    assert_eq!(ex.offset(), Some(118));
    assert!(ex.to_string().contains("(offset: 118)"));
}
