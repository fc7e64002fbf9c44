use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::{ParseOptions, VendorParser};
use crate::errors::{DriftError, Result};
use crate::model::{ConfigTree, VendorTag};
use crate::schema::VendorSchema;

/// Registration table from vendor tag to parser strategy
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    parsers: BTreeMap<VendorTag, VendorParser>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with every vendor bound to its built-in table
    ///
    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` if an embedded table is invalid.
    pub fn with_builtin_schemas() -> Result<Self> {
        let mut registry = Self::empty();
        for vendor in VendorTag::ALL {
            registry.register(VendorSchema::builtin(vendor)?);
        }
        Ok(registry)
    }

    /// Register (or replace) the parser for the table's vendor
    pub fn register(&mut self, schema: VendorSchema) -> Option<VendorParser> {
        let parser = VendorParser::for_schema(schema);
        self.parsers.insert(parser.vendor(), parser)
    }

    /// # Errors
    ///
    /// Returns `DriftError::UnknownVendor` if nothing is registered for `vendor`.
    pub fn get(&self, vendor: VendorTag) -> Result<&VendorParser> {
        self.parsers
            .get(&vendor)
            .ok_or(DriftError::UnknownVendor { vendor })
    }

    pub fn vendors(&self) -> impl Iterator<Item = VendorTag> + '_ {
        self.parsers.keys().copied()
    }

    /// # Errors
    ///
    /// `DriftError::UnknownVendor` or any error of [`VendorParser::parse`].
    pub fn parse(
        &self,
        raw: &[u8],
        vendor: VendorTag,
        captured_at: DateTime<Utc>,
        options: &ParseOptions,
    ) -> Result<ConfigTree> {
        self.get(vendor)?.parse(raw, captured_at, options)
    }
}

static DEFAULT_REGISTRY: OnceLock<Result<ParserRegistry>> = OnceLock::new();

/// Process-wide registry built from the embedded tables
///
/// # Errors
///
/// Returns the table error if an embedded table is invalid.
pub fn default_registry() -> Result<&'static ParserRegistry> {
    DEFAULT_REGISTRY
        .get_or_init(ParserRegistry::with_builtin_schemas)
        .as_ref()
        .map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_covers_all_vendors() {
        let registry = ParserRegistry::with_builtin_schemas().unwrap();
        assert_eq!(registry.vendors().count(), VendorTag::ALL.len());
    }

    #[test]
    fn test_empty_registry_reports_unknown_vendor() {
        let err = ParserRegistry::empty().get(VendorTag::Panos).unwrap_err();
        assert_eq!(err, DriftError::UnknownVendor { vendor: VendorTag::Panos });
    }

    #[test]
    fn test_register_replaces_existing_parser() {
        let mut registry = ParserRegistry::with_builtin_schemas().unwrap();
        let yaml = "schema_version: 1\nrevision: 99\nvendor: junos\nrules:\n  - line: \"host-name\"\n    kind: scalar\n    key_tokens: 1\n";
        let replaced = registry.register(VendorSchema::from_yaml("override", yaml).unwrap());
        assert!(replaced.is_some());
        assert_eq!(registry.get(VendorTag::Junos).unwrap().schema().revision(), 99);
    }
}
