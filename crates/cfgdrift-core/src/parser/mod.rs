//! Vendor configuration parsers.
//!
//! Raw bytes plus a [`VendorTag`] go in, a normalized [`ConfigTree`] comes
//! out. Each vendor is served by one of three syntax strategies
//! ([`VendorParser`]) driven by the vendor's schema table; the
//! [`ParserRegistry`] selects the strategy by tag.
//!
//! Parsing is a pure function of the input bytes, the vendor table and the
//! options: no I/O, no global state beyond the lazily built default registry.

pub mod braced;
pub mod indented;
pub mod json;
pub mod normalize;
pub mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{DriftError, Result};
use crate::model::{ConfigTree, SyntaxFamily, VendorTag};
use crate::schema::VendorSchema;
use crate::{log_op_end, log_op_error, log_op_start};

pub use normalize::RawStatement;
pub use registry::{default_registry, ParserRegistry};

/// Parser behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Reject top-level statements that are neither matched by a schema rule
    /// nor listed in the table's `known_directives`
    pub strict: bool,
    /// Maximum block nesting accepted from the raw input
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_nesting: 256,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// One syntax strategy bound to a vendor schema table
#[derive(Debug, Clone)]
pub enum VendorParser {
    IndentedCli(Arc<VendorSchema>),
    BracedCli(Arc<VendorSchema>),
    Json(Arc<VendorSchema>),
}

impl VendorParser {
    /// Pick the strategy matching the table's vendor
    pub fn for_schema(schema: VendorSchema) -> Self {
        let schema = Arc::new(schema);
        match schema.vendor().syntax() {
            SyntaxFamily::IndentedCli => VendorParser::IndentedCli(schema),
            SyntaxFamily::BracedCli => VendorParser::BracedCli(schema),
            SyntaxFamily::Json => VendorParser::Json(schema),
        }
    }

    pub fn schema(&self) -> &VendorSchema {
        match self {
            VendorParser::IndentedCli(schema)
            | VendorParser::BracedCli(schema)
            | VendorParser::Json(schema) => schema,
        }
    }

    pub fn vendor(&self) -> VendorTag {
        self.schema().vendor()
    }

    /// Parse raw bytes into a tree.
    ///
    /// # Errors
    ///
    /// Returns `DriftError::Parse` on invalid UTF-8, malformed structure, or
    /// (in strict mode) unknown top-level directives.
    pub fn parse(
        &self,
        raw: &[u8],
        captured_at: DateTime<Utc>,
        options: &ParseOptions,
    ) -> Result<ConfigTree> {
        let start = Instant::now();
        let vendor = self.vendor();
        log_op_start!("parse", vendor = %vendor, bytes = raw.len(), strict = options.strict);

        match self.parse_inner(raw, captured_at, options) {
            Ok(tree) => {
                log_op_end!(
                    "parse",
                    duration_ms = start.elapsed().as_millis() as u64,
                    vendor = %vendor,
                    node_count = tree.root().node_count()
                );
                Ok(tree)
            }
            Err(err) => {
                log_op_error!(
                    "parse",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    vendor = %vendor
                );
                Err(err)
            }
        }
    }

    fn parse_inner(
        &self,
        raw: &[u8],
        captured_at: DateTime<Utc>,
        options: &ParseOptions,
    ) -> Result<ConfigTree> {
        let vendor = self.vendor();
        let text = std::str::from_utf8(raw).map_err(|e| DriftError::Parse {
            vendor,
            offset: e.valid_up_to(),
            reason: "input is not valid UTF-8".to_string(),
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let root = match self {
            VendorParser::IndentedCli(schema) => {
                let statements = indented::lex(text, schema, options.max_nesting)?;
                normalize::CliNormalizer::new(schema, options.strict).normalize_root(&statements)?
            }
            VendorParser::BracedCli(schema) => {
                let statements = braced::lex(text, schema, options.max_nesting)?;
                normalize::CliNormalizer::new(schema, options.strict).normalize_root(&statements)?
            }
            VendorParser::Json(schema) => json::parse(text, schema, options.max_nesting)?,
        };
        Ok(ConfigTree::new(vendor, captured_at, root))
    }
}

/// Parse with the built-in tables.
///
/// # Errors
///
/// Returns `DriftError::SchemaTable` if a built-in table is broken, otherwise
/// see [`VendorParser::parse`].
pub fn parse(
    raw: &[u8],
    vendor: VendorTag,
    captured_at: DateTime<Utc>,
    options: &ParseOptions,
) -> Result<ConfigTree> {
    default_registry()?.parse(raw, vendor, captured_at, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_invalid_utf8_reports_offset() {
        let raw = b"hostname r1\n\xff\xfe\n";
        let err = parse(raw, VendorTag::CiscoIos, at(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DriftError::Parse { offset: 12, vendor: VendorTag::CiscoIos, .. }));
    }

    #[test]
    fn test_strategy_follows_vendor_syntax() {
        let parser = VendorParser::for_schema(VendorSchema::builtin(VendorTag::F5Bigip).unwrap());
        assert!(matches!(parser, VendorParser::BracedCli(_)));
        assert_eq!(parser.vendor(), VendorTag::F5Bigip);
    }

    #[test]
    fn test_bom_is_ignored() {
        let tree = parse(
            "\u{feff}hostname r1\n".as_bytes(),
            VendorTag::AristaEos,
            at(),
            &ParseOptions::default(),
        )
        .unwrap();
        assert!(tree.root().child("hostname").is_some());
        assert_eq!(tree.captured_at(), at());
    }
}
