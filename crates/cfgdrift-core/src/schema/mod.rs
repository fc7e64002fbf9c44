//! Vendor schema tables: data that tells parsers how each construct compares.

pub mod canonical;
pub mod pattern;
pub mod table;

pub use canonical::ValueKind;
pub use pattern::{LinePattern, PathPattern, PatternError};
pub use table::{
    ElementKey, RuleDocument, RuleMatcher, SchemaDocument, SchemaRule, VendorSchema,
    SUPPORTED_SCHEMA_VERSION,
};
