//! Classification rule tables.
//!
//! An ordered list of path patterns, each mapped to a classification. A rule
//! covers the path it names and every path below it, so
//! `"ip access-list *"` classifies both a whole ACL and a single entry
//! inside it.
//!
//! ```yaml
//! schema_version: 1
//! revision: 2
//! rules:
//!   - pattern: "**/description"
//!     classification: cosmetic
//!   - pattern: "ip access-list *"
//!     classification: security_impacting
//!   - pattern: "/**/security/rules"
//!     classification: security_impacting
//!     vendors: [panos]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{DriftError, Result};
use crate::model::{Classification, ConfigPath, DeltaOp, VendorTag};
use crate::schema::{PathPattern, SUPPORTED_SCHEMA_VERSION};

const BUILTIN_RULES: &str = include_str!("../../tables/classification.yaml");

fn default_case_insensitive() -> bool {
    true
}

/// On-disk rule table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTableDocument {
    pub schema_version: u32,
    pub revision: u32,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub rules: Vec<ClassificationRuleDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationRuleDocument {
    pub pattern: String,
    pub classification: Classification,
    /// Restrict the rule to these vendors
    #[serde(default)]
    pub vendors: Option<Vec<VendorTag>>,
    /// Restrict the rule to these operations
    #[serde(default)]
    pub operations: Option<Vec<DeltaOp>>,
}

/// One compiled classification rule
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub pattern: PathPattern,
    pub classification: Classification,
    pub vendors: Option<Vec<VendorTag>>,
    pub operations: Option<Vec<DeltaOp>>,
}

impl ClassificationRule {
    pub fn applies(&self, path: &ConfigPath, op: DeltaOp, vendor: VendorTag) -> bool {
        if let Some(vendors) = &self.vendors {
            if !vendors.contains(&vendor) {
                return false;
            }
        }
        if let Some(ops) = &self.operations {
            if !ops.contains(&op) {
                return false;
            }
        }
        self.covers(path)
    }

    /// The pattern names `path` or one of its ancestors (the root only
    /// counts when `path` is the root)
    fn covers(&self, path: &ConfigPath) -> bool {
        let segments = path.segments();
        if segments.is_empty() {
            return self.pattern.matches_segments(segments);
        }
        (1..=segments.len()).any(|n| self.pattern.matches_segments(&segments[..n]))
    }
}

/// Validated, ordered rule table
#[derive(Debug, Clone)]
pub struct RuleTable {
    name: String,
    revision: u32,
    rules: Vec<ClassificationRule>,
}

impl RuleTable {
    /// The embedded default table
    ///
    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` if the embedded table is invalid.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml("builtin:classification", BUILTIN_RULES)
    }

    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DriftError::schema_table(&name, format!("failed to read: {}", e)))?;
        Self::from_yaml(&name, &content)
    }

    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` on YAML errors, an unsupported
    /// `schema_version`, invalid patterns or a rule that maps to
    /// `unclassified`.
    pub fn from_yaml(name: &str, content: &str) -> Result<Self> {
        let doc: RuleTableDocument = serde_yaml::from_str(content)
            .map_err(|e| DriftError::schema_table(name, format!("YAML parse error: {}", e)))?;
        Self::from_document(name, doc)
    }

    /// # Errors
    ///
    /// See [`RuleTable::from_yaml`].
    pub fn from_document(name: &str, doc: RuleTableDocument) -> Result<Self> {
        if doc.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(DriftError::schema_table(
                name,
                format!(
                    "Unsupported schema_version: {}. Expected {}",
                    doc.schema_version, SUPPORTED_SCHEMA_VERSION
                ),
            ));
        }

        let rules = doc
            .rules
            .into_iter()
            .enumerate()
            .map(|(idx, rule)| {
                if rule.classification == Classification::Unclassified {
                    return Err(DriftError::schema_table(
                        name,
                        format!("rule {}: classification cannot be 'unclassified'", idx),
                    ));
                }
                let pattern = PathPattern::parse(&rule.pattern, doc.case_insensitive).map_err(
                    |e| DriftError::schema_table(name, format!("rule {}: {}", idx, e)),
                )?;
                Ok(ClassificationRule {
                    pattern,
                    classification: rule.classification,
                    vendors: rule.vendors,
                    operations: rule.operations,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            revision: doc.revision,
            rules,
        })
    }

    /// A table with no rules: everything classifies as structural
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            revision: 0,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// First rule applying to the change
    pub fn first_match(
        &self,
        path: &ConfigPath,
        op: DeltaOp,
        vendor: VendorTag,
    ) -> Option<&ClassificationRule> {
        self.rules.iter().find(|r| r.applies(path, op, vendor))
    }
}
