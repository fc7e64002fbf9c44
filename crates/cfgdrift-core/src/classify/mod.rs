//! Change classifier.
//!
//! Annotates delta entries with a [`Classification`] using an ordered
//! [`RuleTable`]. The first applicable rule wins; entries no rule covers are
//! `Structural`, so a change never becomes invisible through classification.

pub mod rules;

use std::time::Instant;

use crate::model::{Classification, DeltaEntry, DeltaResult, VendorTag};
use crate::{log_op_end, log_op_start};

pub use rules::{ClassificationRule, ClassificationRuleDocument, RuleTable, RuleTableDocument};

/// Tree-level context a rule may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyContext {
    pub vendor: VendorTag,
}

impl ClassifyContext {
    pub fn new(vendor: VendorTag) -> Self {
        Self { vendor }
    }

    /// Context of the trees a delta was computed from
    pub fn for_result(result: &DeltaResult) -> Self {
        Self::new(result.after.vendor)
    }
}

/// Classify a single entry. Never returns `Unclassified`.
pub fn classify(entry: &DeltaEntry, table: &RuleTable, ctx: &ClassifyContext) -> Classification {
    table
        .first_match(&entry.path, entry.op, ctx.vendor)
        .map_or(Classification::Structural, |rule| rule.classification)
}

/// Classify every entry of a result, leaving order and content untouched
pub fn classify_all(mut result: DeltaResult, table: &RuleTable, ctx: &ClassifyContext) -> DeltaResult {
    let start = Instant::now();
    log_op_start!("classify", vendor = %ctx.vendor, entry_count = result.entries.len());

    for entry in &mut result.entries {
        entry.classification = classify(entry, table, ctx);
    }

    log_op_end!(
        "classify",
        duration_ms = start.elapsed().as_millis() as u64,
        table = table.name(),
        security_impacting = result.summary().security_impacting()
    );
    result
}
