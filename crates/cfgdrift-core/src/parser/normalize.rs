//! Schema-driven normalization of lexed CLI statements.
//!
//! Both CLI lexers produce the same [`RawStatement`] tree; this module turns
//! it into [`ConfigNode`]s using the vendor schema table.

use cfgdrift_core_types::Sensitive;
use std::collections::HashMap;

use crate::digest::fingerprint_secret;
use crate::errors::{DriftError, Result};
use crate::model::{ConfigNode, ConfigPath, NodeKind, VendorTag};
use crate::schema::canonical::{canonicalize, split_values, strip_sequence, tokenize};
use crate::schema::{ElementKey, SchemaRule, VendorSchema};

/// One lexed statement with its nested block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    /// Statement text without terminator or block braces
    pub text: String,
    /// Byte offset of the statement in the raw input
    pub offset: usize,
    /// Verbatim multi-line body (IOS banners)
    pub literal: Option<String>,
    pub children: Vec<RawStatement>,
}

impl RawStatement {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
            literal: None,
            children: Vec::new(),
        }
    }
}

/// Element of a list or set before key derivation
struct Item<'a> {
    text: String,
    children: &'a [RawStatement],
}

enum Pending<'a> {
    Node(ConfigNode),
    Group {
        path: ConfigPath,
        rule: &'a SchemaRule,
        items: Vec<Item<'a>>,
    },
}

pub(crate) struct CliNormalizer<'s> {
    schema: &'s VendorSchema,
    vendor: VendorTag,
    strict: bool,
}

impl<'s> CliNormalizer<'s> {
    pub(crate) fn new(schema: &'s VendorSchema, strict: bool) -> Self {
        Self {
            schema,
            vendor: schema.vendor(),
            strict,
        }
    }

    pub(crate) fn normalize_root(&self, statements: &[RawStatement]) -> Result<ConfigNode> {
        let root = ConfigPath::root();
        let children = self.normalize_block(&root, statements)?;
        Ok(ConfigNode::keyed_map(root, children))
    }

    /// Canonical statement text: collapsed whitespace, keywords folded for
    /// case-insensitive vendors. Names matched by rule wildcards keep their case.
    fn canonical_text(&self, parent: &ConfigPath, text: &str) -> String {
        let mut tokens: Vec<String> = tokenize(text).into_iter().map(str::to_string).collect();
        if self.schema.case_insensitive() && !tokens.is_empty() {
            tokens[0] = tokens[0].to_lowercase();
            let keywords = {
                let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
                self.schema.keyword_positions(parent, &refs)
            };
            for idx in keywords {
                if let Some(token) = tokens.get_mut(idx) {
                    *token = token.to_lowercase();
                }
            }
        }
        tokens.join(" ")
    }

    fn normalize_block<'a>(
        &self,
        parent: &ConfigPath,
        statements: &'a [RawStatement],
    ) -> Result<Vec<ConfigNode>>
    where
        's: 'a,
    {
        let mut pending: Vec<Pending<'a>> = Vec::new();
        let mut groups: HashMap<String, usize> = HashMap::new();

        for stmt in statements {
            let text = self.canonical_text(parent, &stmt.text);
            let tokens = tokenize(&text);
            if tokens.is_empty() {
                continue;
            }

            if let Some(body) = &stmt.literal {
                pending.push(Pending::Node(ConfigNode::scalar(
                    parent.child(text.clone()),
                    body.clone(),
                )));
                continue;
            }

            match self.schema.match_line(parent, &tokens) {
                Some(rule) if rule.group => {
                    let n = rule.key_tokens.unwrap_or(1).min(tokens.len());
                    let key = tokens[..n].join(" ");
                    let rest = tokens[n..].join(" ");
                    let slot = *groups.entry(key.clone()).or_insert_with(|| {
                        pending.push(Pending::Group {
                            path: parent.child(key),
                            rule,
                            items: Vec::new(),
                        });
                        pending.len() - 1
                    });
                    if let Some(Pending::Group { items, .. }) = pending.get_mut(slot) {
                        if !rest.is_empty() {
                            items.push(Item {
                                text: rest,
                                children: &stmt.children,
                            });
                        }
                    }
                }
                Some(rule) => pending.push(Pending::Node(self.apply_rule(
                    parent, stmt, &text, &tokens, rule,
                )?)),
                None => {
                    if self.strict && parent.is_root() && !self.schema.is_known_directive(tokens[0])
                    {
                        return Err(DriftError::Parse {
                            vendor: self.vendor,
                            offset: stmt.offset,
                            reason: format!("unknown directive '{}' in strict mode", tokens[0]),
                        });
                    }
                    pending.push(Pending::Node(self.default_node(parent, stmt, &text)?));
                }
            }
        }

        let mut nodes = Vec::with_capacity(pending.len());
        for entry in pending {
            match entry {
                Pending::Node(node) => nodes.push(node),
                Pending::Group { path, rule, items } => {
                    let kind = rule.kind.unwrap_or(NodeKind::OrderedList);
                    nodes.push(self.build_collection(path, rule, kind, items)?);
                }
            }
        }
        Ok(disambiguate(parent, nodes))
    }

    fn default_node(
        &self,
        parent: &ConfigPath,
        stmt: &RawStatement,
        text: &str,
    ) -> Result<ConfigNode> {
        let path = parent.child(text);
        if stmt.children.is_empty() {
            Ok(ConfigNode::scalar(path, text))
        } else {
            let children = self.normalize_block(&path, &stmt.children)?;
            Ok(ConfigNode::keyed_map(path, children))
        }
    }

    fn apply_rule(
        &self,
        parent: &ConfigPath,
        stmt: &RawStatement,
        text: &str,
        tokens: &[&str],
        rule: &SchemaRule,
    ) -> Result<ConfigNode> {
        let has_children = !stmt.children.is_empty();
        let kind = rule.kind.unwrap_or(if has_children {
            NodeKind::KeyedMap
        } else {
            NodeKind::Scalar
        });

        match kind {
            NodeKind::Scalar if has_children => self.default_node(parent, stmt, text),
            NodeKind::Scalar => {
                let (key, raw_value) = match rule.key_tokens {
                    Some(n) => {
                        let n = n.min(tokens.len());
                        (tokens[..n].join(" "), tokens[n..].join(" "))
                    }
                    None => (text.to_string(), text.to_string()),
                };
                Ok(ConfigNode::scalar(
                    parent.child(key),
                    self.scalar_value(rule, &raw_value),
                ))
            }
            NodeKind::KeyedMap => {
                let path = parent.child(text);
                let children = self.normalize_block(&path, &stmt.children)?;
                Ok(ConfigNode::keyed_map(path, children))
            }
            NodeKind::OrderedList | NodeKind::UnorderedSet => {
                let (path, items) = match &rule.split {
                    Some(separator) => {
                        let n = rule.key_tokens.unwrap_or(1).min(tokens.len());
                        let values =
                            split_values(&tokens[n..].join(" "), separator, rule.expand_ranges);
                        let items = values
                            .into_iter()
                            .map(|text| Item {
                                text,
                                children: &[],
                            })
                            .collect();
                        (parent.child(tokens[..n].join(" ")), items)
                    }
                    None => {
                        let path = parent.child(text);
                        let items = stmt
                            .children
                            .iter()
                            .map(|child| Item {
                                text: self.canonical_text(&path, &child.text),
                                children: &child.children,
                            })
                            .filter(|item| !item.text.is_empty())
                            .collect();
                        (path, items)
                    }
                };
                self.build_collection(path, rule, kind, items)
            }
        }
    }

    fn build_collection(
        &self,
        path: ConfigPath,
        rule: &SchemaRule,
        kind: NodeKind,
        items: Vec<Item<'_>>,
    ) -> Result<ConfigNode> {
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            let text = match rule.element_key {
                ElementKey::StripSequence => strip_sequence(&item.text),
                _ => item.text,
            };
            let text = canonicalize(rule.value, &text);
            let key = match &rule.element_key {
                ElementKey::Tokens(n) => {
                    let tokens = tokenize(&text);
                    tokens[..(*n).min(tokens.len())].join(" ")
                }
                _ => text.clone(),
            };
            let element_path = path.child(key);
            let element = if item.children.is_empty() {
                ConfigNode::scalar(element_path, self.scalar_value(rule, &text))
            } else {
                let children = self.normalize_block(&element_path, item.children)?;
                ConfigNode::keyed_map(element_path, children)
            };
            elements.push(element);
        }

        Ok(match kind {
            NodeKind::UnorderedSet => ConfigNode::unordered_set(path, elements),
            _ => {
                let elements = disambiguate(&path, elements);
                ConfigNode::ordered_list(path, elements)
            }
        })
    }

    fn scalar_value(&self, rule: &SchemaRule, raw: &str) -> String {
        let value = canonicalize(rule.value, raw);
        if rule.sensitive {
            fingerprint_secret(&Sensitive::new(value))
        } else {
            value
        }
    }
}

/// Give repeated keys an occurrence suffix (`key#2`, `key#3`, ...)
pub(crate) fn disambiguate(parent: &ConfigPath, nodes: Vec<ConfigNode>) -> Vec<ConfigNode> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    nodes
        .into_iter()
        .map(|node| {
            let count = seen.entry(node.key().to_string()).or_insert(0);
            *count += 1;
            if *count == 1 {
                node
            } else {
                let key = format!("{}#{}", node.key(), count);
                node.with_path(parent.child(key))
            }
        })
        .collect()
}
