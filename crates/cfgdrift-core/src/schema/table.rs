//! Vendor schema tables.
//!
//! A schema table tells the parser which constructs are ordered lists,
//! unordered sets or keyed maps, how to derive the canonical key of a list
//! element and how to canonicalize scalar values. Tables are YAML documents
//! versioned by `schema_version` (format) and `revision` (content).
//!
//! ```yaml
//! schema_version: 1
//! revision: 4
//! vendor: cisco_ios
//! comment_prefixes: ["!"]
//! rules:
//!   - line: "ip access-list *"
//!     kind: ordered_list
//!     element_key: strip_sequence
//!   - line: "switchport trunk allowed vlan"
//!     kind: unordered_set
//!     key_tokens: 4
//!     split: ","
//!     expand_ranges: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use super::canonical::ValueKind;
use super::pattern::{LinePattern, PathPattern};
use crate::errors::{DriftError, Result};
use crate::model::{ConfigPath, NodeKind, SyntaxFamily, VendorTag};

/// Table format understood by this build
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

const BUILTIN_CISCO_IOS: &str = include_str!("../../tables/schema/cisco_ios.yaml");
const BUILTIN_ARISTA_EOS: &str = include_str!("../../tables/schema/arista_eos.yaml");
const BUILTIN_JUNOS: &str = include_str!("../../tables/schema/junos.yaml");
const BUILTIN_F5_BIGIP: &str = include_str!("../../tables/schema/f5_bigip.yaml");
const BUILTIN_PANOS: &str = include_str!("../../tables/schema/panos.yaml");
const BUILTIN_MERAKI: &str = include_str!("../../tables/schema/meraki.yaml");

// ========== Document format ==========

/// On-disk schema table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub schema_version: u32,
    pub revision: u32,
    pub vendor: VendorTag,
    #[serde(default)]
    pub comment_prefixes: Vec<String>,
    /// Whole top-level lines dropped before normalization (device chatter)
    #[serde(default)]
    pub ignore_lines: Vec<String>,
    /// Fold keywords to lowercase: the leading token of every statement and
    /// every token a matching line rule names literally
    #[serde(default)]
    pub case_insensitive: bool,
    /// First tokens accepted at top level in strict mode
    #[serde(default)]
    pub known_directives: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub within: Option<String>,
    #[serde(default)]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub key_tokens: Option<usize>,
    #[serde(default)]
    pub group: bool,
    #[serde(default)]
    pub split: Option<String>,
    #[serde(default)]
    pub expand_ranges: bool,
    #[serde(default)]
    pub element_key: ElementKey,
    #[serde(default)]
    pub value: ValueKind,
    #[serde(default)]
    pub sensitive: bool,
}

/// Canonical key function for list and set elements
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ElementKeyDocument", into = "ElementKeyDocument")]
pub enum ElementKey {
    /// The whole canonical element text
    #[default]
    Text,
    /// Element text without a leading sequence number
    StripSequence,
    /// The first `n` tokens
    Tokens(usize),
    /// A field of a JSON object element
    Field(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ElementKeyDocument {
    Named(ElementKeyName),
    Tokens { tokens: usize },
    Field { field: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ElementKeyName {
    Text,
    StripSequence,
}

impl From<ElementKeyDocument> for ElementKey {
    fn from(doc: ElementKeyDocument) -> Self {
        match doc {
            ElementKeyDocument::Named(ElementKeyName::Text) => ElementKey::Text,
            ElementKeyDocument::Named(ElementKeyName::StripSequence) => ElementKey::StripSequence,
            ElementKeyDocument::Tokens { tokens } => ElementKey::Tokens(tokens),
            ElementKeyDocument::Field { field } => ElementKey::Field(field),
        }
    }
}

impl From<ElementKey> for ElementKeyDocument {
    fn from(key: ElementKey) -> Self {
        match key {
            ElementKey::Text => ElementKeyDocument::Named(ElementKeyName::Text),
            ElementKey::StripSequence => ElementKeyDocument::Named(ElementKeyName::StripSequence),
            ElementKey::Tokens(tokens) => ElementKeyDocument::Tokens { tokens },
            ElementKey::Field(field) => ElementKeyDocument::Field { field },
        }
    }
}

// ========== Compiled table ==========

#[derive(Debug, Clone)]
pub enum RuleMatcher {
    Line(LinePattern),
    Path(PathPattern),
}

/// One compiled schema rule
#[derive(Debug, Clone)]
pub struct SchemaRule {
    pub matcher: RuleMatcher,
    pub within: Option<PathPattern>,
    pub kind: Option<NodeKind>,
    pub key_tokens: Option<usize>,
    pub group: bool,
    pub split: Option<String>,
    pub expand_ranges: bool,
    pub element_key: ElementKey,
    pub value: ValueKind,
    pub sensitive: bool,
}

impl SchemaRule {
    fn within_matches(&self, parent: &ConfigPath) -> bool {
        self.within.as_ref().map_or(true, |w| w.matches(parent))
    }
}

/// Validated, compiled schema table for one vendor
#[derive(Debug, Clone)]
pub struct VendorSchema {
    name: String,
    vendor: VendorTag,
    revision: u32,
    comment_prefixes: Vec<String>,
    ignore_lines: Vec<LinePattern>,
    case_insensitive: bool,
    known_directives: BTreeSet<String>,
    rules: Vec<SchemaRule>,
}

impl VendorSchema {
    /// Built-in table for a vendor
    ///
    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` if the embedded table is invalid.
    pub fn builtin(vendor: VendorTag) -> Result<Self> {
        let content = match vendor {
            VendorTag::CiscoIos => BUILTIN_CISCO_IOS,
            VendorTag::AristaEos => BUILTIN_ARISTA_EOS,
            VendorTag::Junos => BUILTIN_JUNOS,
            VendorTag::F5Bigip => BUILTIN_F5_BIGIP,
            VendorTag::Panos => BUILTIN_PANOS,
            VendorTag::Meraki => BUILTIN_MERAKI,
        };
        let schema = Self::from_yaml(&format!("builtin:{}", vendor), content)?;
        if schema.vendor != vendor {
            return Err(DriftError::schema_table(
                schema.name,
                format!("declares vendor {}, expected {}", schema.vendor, vendor),
            ));
        }
        Ok(schema)
    }

    /// Load a table from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DriftError::schema_table(&name, format!("failed to read: {}", e)))?;
        Self::from_yaml(&name, &content)
    }

    /// Parse and validate a table; `name` identifies it in errors
    ///
    /// # Errors
    ///
    /// Returns `DriftError::SchemaTable` on YAML errors, an unsupported
    /// `schema_version`, invalid patterns or contradictory rule fields.
    pub fn from_yaml(name: &str, content: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_yaml::from_str(content)
            .map_err(|e| DriftError::schema_table(name, format!("YAML parse error: {}", e)))?;
        Self::from_document(name, doc)
    }

    /// # Errors
    ///
    /// See [`VendorSchema::from_yaml`].
    pub fn from_document(name: &str, doc: SchemaDocument) -> Result<Self> {
        if doc.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(DriftError::schema_table(
                name,
                format!(
                    "Unsupported schema_version: {}. Expected {}",
                    doc.schema_version, SUPPORTED_SCHEMA_VERSION
                ),
            ));
        }

        let syntax = doc.vendor.syntax();
        let ci = doc.case_insensitive;
        let invalid = |idx: usize, reason: String| {
            DriftError::schema_table(name, format!("rule {}: {}", idx, reason))
        };

        let ignore_lines = doc
            .ignore_lines
            .iter()
            .map(|p| LinePattern::parse(p, ci))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DriftError::schema_table(name, e.to_string()))?;

        let mut rules = Vec::with_capacity(doc.rules.len());
        for (idx, rule) in doc.rules.into_iter().enumerate() {
            let matcher = match (&rule.line, &rule.path, syntax) {
                (Some(line), None, SyntaxFamily::IndentedCli | SyntaxFamily::BracedCli) => {
                    RuleMatcher::Line(
                        LinePattern::parse(line, ci).map_err(|e| invalid(idx, e.to_string()))?,
                    )
                }
                (None, Some(path), SyntaxFamily::Json) => RuleMatcher::Path(
                    PathPattern::parse(path, ci).map_err(|e| invalid(idx, e.to_string()))?,
                ),
                (Some(_), Some(_), _) => {
                    return Err(invalid(idx, "set either 'line' or 'path', not both".into()))
                }
                (None, None, _) => return Err(invalid(idx, "missing 'line' or 'path'".into())),
                (Some(_), None, _) => {
                    return Err(invalid(idx, format!("'line' rules need a CLI vendor, not {}", doc.vendor)))
                }
                (None, Some(_), _) => {
                    return Err(invalid(idx, format!("'path' rules need a JSON vendor, not {}", doc.vendor)))
                }
            };

            let within = rule
                .within
                .as_deref()
                .map(|w| PathPattern::parse(w, ci))
                .transpose()
                .map_err(|e| invalid(idx, e.to_string()))?;

            if rule.key_tokens == Some(0) {
                return Err(invalid(idx, "key_tokens must be at least 1".into()));
            }
            if rule.element_key == ElementKey::Tokens(0) {
                return Err(invalid(idx, "element_key tokens must be at least 1".into()));
            }
            if rule.group && rule.key_tokens.is_none() {
                return Err(invalid(idx, "'group' requires 'key_tokens'".into()));
            }
            let is_collection = matches!(
                rule.kind,
                Some(NodeKind::OrderedList) | Some(NodeKind::UnorderedSet)
            );
            if (rule.group || rule.split.is_some()) && !is_collection {
                return Err(invalid(
                    idx,
                    "'group' and 'split' require kind ordered_list or unordered_set".into(),
                ));
            }
            if rule.group && rule.split.is_some() {
                return Err(invalid(idx, "'group' and 'split' are exclusive".into()));
            }
            if rule.expand_ranges && rule.split.is_none() {
                return Err(invalid(idx, "'expand_ranges' requires 'split'".into()));
            }
            if matches!(rule.element_key, ElementKey::Field(_)) && syntax != SyntaxFamily::Json {
                return Err(invalid(idx, "'field' element keys only apply to JSON".into()));
            }
            if rule.sensitive && syntax != SyntaxFamily::Json && rule.key_tokens.is_none() {
                return Err(invalid(
                    idx,
                    "sensitive CLI rules need 'key_tokens' so the secret stays out of the key".into(),
                ));
            }

            rules.push(SchemaRule {
                matcher,
                within,
                kind: rule.kind,
                key_tokens: rule.key_tokens,
                group: rule.group,
                split: rule.split,
                expand_ranges: rule.expand_ranges,
                element_key: rule.element_key,
                value: rule.value,
                sensitive: rule.sensitive,
            });
        }

        let known_directives = doc
            .known_directives
            .iter()
            .map(|d| if ci { d.to_lowercase() } else { d.clone() })
            .collect();

        Ok(Self {
            name: name.to_string(),
            vendor: doc.vendor,
            revision: doc.revision,
            comment_prefixes: doc.comment_prefixes,
            ignore_lines,
            case_insensitive: ci,
            known_directives,
            rules,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor(&self) -> VendorTag {
        self.vendor
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn rules(&self) -> &[SchemaRule] {
        &self.rules
    }

    pub fn is_comment(&self, line: &str) -> bool {
        self.comment_prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    pub fn is_ignored(&self, tokens: &[&str]) -> bool {
        self.ignore_lines.iter().any(|p| p.matches_exact(tokens))
    }

    pub fn is_known_directive(&self, keyword: &str) -> bool {
        if self.case_insensitive {
            self.known_directives.contains(&keyword.to_lowercase())
        } else {
            self.known_directives.contains(keyword)
        }
    }

    /// First line rule matching a statement under `parent`
    pub fn match_line(&self, parent: &ConfigPath, tokens: &[&str]) -> Option<&SchemaRule> {
        self.rules.iter().find(|rule| match &rule.matcher {
            RuleMatcher::Line(p) => p.matches_prefix(tokens) && rule.within_matches(parent),
            RuleMatcher::Path(_) => false,
        })
    }

    /// Token positions that the first matching line rule spells out as keywords
    pub fn keyword_positions(&self, parent: &ConfigPath, tokens: &[&str]) -> Vec<usize> {
        match self.match_line(parent, tokens).map(|rule| &rule.matcher) {
            Some(RuleMatcher::Line(pattern)) => pattern.literal_positions().collect(),
            _ => Vec::new(),
        }
    }

    /// First path rule matching a JSON node
    pub fn match_path(&self, path: &ConfigPath) -> Option<&SchemaRule> {
        self.rules.iter().find(|rule| match &rule.matcher {
            RuleMatcher::Path(p) => {
                p.matches(path) && path.parent().map_or(true, |parent| rule.within_matches(&parent))
            }
            RuleMatcher::Line(_) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_tables_load() {
        for vendor in VendorTag::ALL {
            let schema = VendorSchema::builtin(vendor).unwrap();
            assert_eq!(schema.vendor(), vendor);
            assert!(!schema.rules().is_empty(), "{} has no rules", vendor);
        }
    }

    #[test]
    fn test_reject_invalid_schema_version() {
        let err = VendorSchema::from_yaml(
            "t",
            "schema_version: 99\nrevision: 1\nvendor: junos\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn test_reject_path_rule_for_cli_vendor() {
        let yaml = r#"
schema_version: 1
revision: 1
vendor: cisco_ios
rules:
  - path: "/a/b"
    kind: ordered_list
"#;
        let err = VendorSchema::from_yaml("t", yaml).unwrap_err();
        assert!(err.to_string().contains("rule 0"));
    }

    #[test]
    fn test_reject_group_without_key_tokens() {
        let yaml = r#"
schema_version: 1
revision: 1
vendor: cisco_ios
rules:
  - line: "access-list *"
    kind: ordered_list
    group: true
"#;
        let err = VendorSchema::from_yaml("t", yaml).unwrap_err();
        assert!(err.to_string().contains("key_tokens"));
    }

    #[test]
    fn test_element_key_forms() {
        let yaml = r#"
schema_version: 1
revision: 1
vendor: meraki
rules:
  - path: "/rules"
    kind: ordered_list
    element_key: { field: comment }
  - path: "/vlans"
    kind: unordered_set
    element_key: text
"#;
        let schema = VendorSchema::from_yaml("t", yaml).unwrap();
        assert_eq!(
            schema.rules()[0].element_key,
            ElementKey::Field("comment".to_string())
        );
        assert_eq!(schema.rules()[1].element_key, ElementKey::Text);
    }

    #[test]
    fn test_match_line_respects_within_and_order() {
        let yaml = r#"
schema_version: 1
revision: 1
vendor: junos
rules:
  - line: "term *"
    within: "/firewall/**"
    kind: keyed_map
  - line: "term *"
    kind: scalar
"#;
        let schema = VendorSchema::from_yaml("t", yaml).unwrap();
        let in_firewall = ConfigPath::from_segments(["firewall", "filter EDGE"]);
        let rule = schema.match_line(&in_firewall, &["term", "a"]).unwrap();
        assert_eq!(rule.kind, Some(NodeKind::KeyedMap));
        let elsewhere = schema.match_line(&ConfigPath::root(), &["term", "a"]).unwrap();
        assert_eq!(elsewhere.kind, Some(NodeKind::Scalar));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "schema_version: 1\nrevision: 1\nvendor: junos\nflavour: x\n";
        assert!(VendorSchema::from_yaml("t", yaml).is_err());
    }
}
