//! Normalizer for JSON REST payloads (PAN-OS, Meraki).
//!
//! Objects become keyed maps, arrays become ordered lists unless a schema
//! rule says `unordered_set`, scalars become their canonical text. Element
//! keys default to the canonical JSON text of the element.

use cfgdrift_core_types::Sensitive;
use serde_json::Value;

use super::normalize::disambiguate;
use crate::digest::fingerprint_secret;
use crate::errors::{DriftError, Result};
use crate::model::{ConfigNode, ConfigPath, NodeKind};
use crate::schema::canonical::canonicalize;
use crate::schema::{ElementKey, SchemaRule, VendorSchema};

/// Parse and normalize a JSON document.
///
/// # Errors
///
/// `DriftError::Parse` with the byte offset reported by `serde_json`, or when
/// nesting exceeds `max_depth`.
pub(crate) fn parse(text: &str, schema: &VendorSchema, max_depth: usize) -> Result<ConfigNode> {
    let value: Value = serde_json::from_str(text).map_err(|e| DriftError::Parse {
        vendor: schema.vendor(),
        offset: byte_offset(text, e.line(), e.column()),
        reason: format!("invalid JSON: {}", e),
    })?;
    let normalizer = JsonNormalizer { schema, max_depth };
    normalizer.node(ConfigPath::root(), &value, None)
}

/// `serde_json` reports 1-based line and column; column counts bytes
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// Canonical text of a JSON value; strings lose their quotes
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct JsonNormalizer<'a> {
    schema: &'a VendorSchema,
    max_depth: usize,
}

impl JsonNormalizer<'_> {
    /// `inherited` is the rule of the enclosing array; scalar elements
    /// without a rule of their own take its value form
    fn node(
        &self,
        path: ConfigPath,
        value: &Value,
        inherited: Option<&SchemaRule>,
    ) -> Result<ConfigNode> {
        if path.depth() > self.max_depth {
            return Err(DriftError::Parse {
                vendor: self.schema.vendor(),
                offset: 0,
                reason: format!("nesting deeper than {} levels at {}", self.max_depth, path),
            });
        }
        let rule = self.schema.match_path(&path).or(inherited);

        match value {
            Value::Object(map) => {
                let children = map
                    .iter()
                    .map(|(key, child)| self.node(path.child(key.clone()), child, None))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ConfigNode::keyed_map(path, children))
            }
            Value::Array(items) => {
                let kind = match rule.and_then(|r| r.kind) {
                    Some(NodeKind::UnorderedSet) => NodeKind::UnorderedSet,
                    _ => NodeKind::OrderedList,
                };
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    let key = element_key_of(rule, item);
                    let inherited = match item {
                        Value::Object(_) | Value::Array(_) => None,
                        _ => rule,
                    };
                    elements.push(self.node(path.child(key), item, inherited)?);
                }
                Ok(match kind {
                    NodeKind::UnorderedSet => ConfigNode::unordered_set(path, elements),
                    _ => {
                        let elements = disambiguate(&path, elements);
                        ConfigNode::ordered_list(path, elements)
                    }
                })
            }
            scalar => Ok(ConfigNode::scalar(path, scalar_value(rule, scalar))),
        }
    }
}

/// Field keys use the field's text; scalar elements use their canonical
/// value so notation changes do not re-key them
fn element_key_of(rule: Option<&SchemaRule>, item: &Value) -> String {
    if let Some(ElementKey::Field(field)) = rule.map(|r| &r.element_key) {
        if let Some(value) = item.get(field) {
            return scalar_text(value);
        }
    }
    match (rule, item) {
        (_, Value::Object(_) | Value::Array(_)) | (None, _) => scalar_text(item),
        (Some(rule), scalar) => canonicalize(rule.value, &scalar_text(scalar)),
    }
}

fn scalar_value(rule: Option<&SchemaRule>, value: &Value) -> String {
    let text = scalar_text(value);
    match rule {
        Some(rule) => {
            let canonical = canonicalize(rule.value, &text);
            if rule.sensitive {
                fingerprint_secret(&Sensitive::new(canonical))
            } else {
                canonical
            }
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VendorTag;

    fn meraki() -> VendorSchema {
        VendorSchema::builtin(VendorTag::Meraki).unwrap()
    }

    #[test]
    fn test_objects_arrays_and_scalars() {
        let text = r#"{"vlans": [{"id": 20, "subnet": "10.0.20.7/24"}, {"id": 10, "subnet": "10.0.10.0/24"}],
                       "rules": [{"policy": "deny"}, {"policy": "allow"}]}"#;
        let root = parse(text, &meraki(), 64).unwrap();

        let vlans = root.child("vlans").unwrap();
        assert_eq!(vlans.kind(), NodeKind::UnorderedSet);
        let keys: Vec<&str> = vlans.children().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["10", "20"]);
        let subnet = vlans.child("20").and_then(|v| v.child("subnet")).unwrap();
        assert_eq!(subnet.value(), Some("10.0.20.0/24"));

        let rules = root.child("rules").unwrap();
        assert_eq!(rules.kind(), NodeKind::OrderedList);
        assert_eq!(rules.children()[0].key(), r#"{"policy":"deny"}"#);
    }

    #[test]
    fn test_scalar_elements_keyed_by_canonical_value() {
        let yaml = r#"
schema_version: 1
revision: 1
vendor: meraki
rules:
  - path: "/dns/servers"
    kind: unordered_set
    value: ip
"#;
        let schema = VendorSchema::from_yaml("t", yaml).unwrap();
        let before = parse(r#"{"dns": {"servers": ["2001:DB8:0::1", "192.0.2.53"]}}"#, &schema, 64).unwrap();
        let after = parse(r#"{"dns": {"servers": ["192.0.2.53", "2001:db8::1"]}}"#, &schema, 64).unwrap();

        assert_eq!(before, after);
        let servers = after.get(&ConfigPath::from_segments(["dns", "servers"])).unwrap();
        let element = servers.child("2001:db8::1").unwrap();
        assert_eq!(element.value(), Some("2001:db8::1"));
    }

    #[test]
    fn test_sensitive_json_field() {
        let root = parse(r#"{"ssids": [{"number": 0, "psk": "hunter22"}]}"#, &meraki(), 64).unwrap();
        let psk = root
            .get(&ConfigPath::from_segments(["ssids", "0", "psk"]))
            .and_then(|n| n.value())
            .unwrap();
        assert!(psk.starts_with("sha256:"));
    }

    #[test]
    fn test_invalid_json_offset() {
        let text = "{\n  \"a\": 1,\n  \"b\": ]\n}";
        let err = parse(text, &meraki(), 64).unwrap_err();
        match err {
            DriftError::Parse { offset, .. } => {
                let line_three = text.find("\"b\"").unwrap();
                assert!(offset >= line_three && offset < text.len());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
