use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::path::ConfigPath;

/// Comparison semantics of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Leaf value compared by equality
    Scalar,
    /// Children whose order is semantically significant (ACL rules, policy terms)
    OrderedList,
    /// Children identified by canonical key, order irrelevant (VLAN sets, NTP servers)
    UnorderedSet,
    /// Children addressed by unique key
    KeyedMap,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Scalar => "scalar",
            NodeKind::OrderedList => "ordered_list",
            NodeKind::UnorderedSet => "unordered_set",
            NodeKind::KeyedMap => "keyed_map",
        };
        f.write_str(name)
    }
}

/// Value or children of a node, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeBody {
    Scalar(String),
    OrderedList(Vec<ConfigNode>),
    /// Stored sorted by canonical key
    UnorderedSet(Vec<ConfigNode>),
    KeyedMap(BTreeMap<String, ConfigNode>),
}

/// A node in the normalized configuration tree.
///
/// The last segment of `path` is the node's key inside its parent: the map
/// key for keyed maps, the canonical element key for lists and sets.
/// Constructors re-path children so `child.path == parent.path.child(key)`
/// always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    pub path: ConfigPath,
    #[serde(flatten)]
    pub body: NodeBody,
}

impl ConfigNode {
    pub fn scalar(path: ConfigPath, value: impl Into<String>) -> Self {
        Self {
            path,
            body: NodeBody::Scalar(value.into()),
        }
    }

    /// Keyed map; a later child with a duplicate key replaces the earlier one
    pub fn keyed_map(path: ConfigPath, children: impl IntoIterator<Item = ConfigNode>) -> Self {
        let map = children
            .into_iter()
            .map(|child| {
                let key = child.key().to_string();
                let child = child.with_path(path.child(key.clone()));
                (key, child)
            })
            .collect();
        Self {
            path,
            body: NodeBody::KeyedMap(map),
        }
    }

    pub fn ordered_list(path: ConfigPath, children: impl IntoIterator<Item = ConfigNode>) -> Self {
        let children = Self::repath_children(&path, children);
        Self {
            path,
            body: NodeBody::OrderedList(children),
        }
    }

    pub fn unordered_set(path: ConfigPath, children: impl IntoIterator<Item = ConfigNode>) -> Self {
        let mut children = Self::repath_children(&path, children);
        children.sort_by(|a, b| a.key().cmp(b.key()));
        children.dedup_by(|a, b| a.key() == b.key());
        Self {
            path,
            body: NodeBody::UnorderedSet(children),
        }
    }

    fn repath_children(
        path: &ConfigPath,
        children: impl IntoIterator<Item = ConfigNode>,
    ) -> Vec<ConfigNode> {
        children
            .into_iter()
            .map(|child| {
                let key = child.key().to_string();
                child.with_path(path.child(key))
            })
            .collect()
    }

    /// Move the node (and its whole subtree) to a new path
    pub fn with_path(mut self, path: ConfigPath) -> Self {
        self.repath(path);
        self
    }

    pub(crate) fn repath(&mut self, path: ConfigPath) {
        let mut stack = vec![(self, path)];
        while let Some((node, path)) = stack.pop() {
            node.path = path;
            let parent = node.path.clone();
            for child in node.children_mut() {
                let key = child.key().to_string();
                stack.push((child, parent.child(key)));
            }
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Scalar(_) => NodeKind::Scalar,
            NodeBody::OrderedList(_) => NodeKind::OrderedList,
            NodeBody::UnorderedSet(_) => NodeKind::UnorderedSet,
            NodeBody::KeyedMap(_) => NodeKind::KeyedMap,
        }
    }

    /// Key inside the parent; empty for the root
    pub fn key(&self) -> &str {
        self.path.last().unwrap_or("")
    }

    /// Scalar value, if this is a scalar
    pub fn value(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind() != NodeKind::Scalar
    }

    /// Children in stored order (map key order for keyed maps)
    pub fn children(&self) -> Vec<&ConfigNode> {
        match &self.body {
            NodeBody::Scalar(_) => Vec::new(),
            NodeBody::OrderedList(items) | NodeBody::UnorderedSet(items) => items.iter().collect(),
            NodeBody::KeyedMap(map) => map.values().collect(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut ConfigNode> {
        match &mut self.body {
            NodeBody::Scalar(_) => Vec::new(),
            NodeBody::OrderedList(items) | NodeBody::UnorderedSet(items) => {
                items.iter_mut().collect()
            }
            NodeBody::KeyedMap(map) => map.values_mut().collect(),
        }
    }

    /// Direct child by key
    pub fn child(&self, key: &str) -> Option<&ConfigNode> {
        match &self.body {
            NodeBody::Scalar(_) => None,
            NodeBody::OrderedList(items) | NodeBody::UnorderedSet(items) => {
                items.iter().find(|c| c.key() == key)
            }
            NodeBody::KeyedMap(map) => map.get(key),
        }
    }

    pub(crate) fn child_mut(&mut self, key: &str) -> Option<&mut ConfigNode> {
        match &mut self.body {
            NodeBody::Scalar(_) => None,
            NodeBody::OrderedList(items) | NodeBody::UnorderedSet(items) => {
                items.iter_mut().find(|c| c.key() == key)
            }
            NodeBody::KeyedMap(map) => map.get_mut(key),
        }
    }

    /// Resolve a path below this node. `path` is absolute (includes this
    /// node's own path as prefix).
    pub fn get(&self, path: &ConfigPath) -> Option<&ConfigNode> {
        if !path.starts_with(&self.path) {
            return None;
        }
        let mut node = self;
        for key in &path.segments()[self.path.depth()..] {
            node = node.child(key)?;
        }
        Some(node)
    }

    pub(crate) fn get_mut(&mut self, path: &ConfigPath) -> Option<&mut ConfigNode> {
        if !path.starts_with(&self.path) {
            return None;
        }
        let depth = self.path.depth();
        let mut node = self;
        for key in &path.segments()[depth..] {
            node = node.child_mut(key)?;
        }
        Some(node)
    }

    /// Total number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    /// Deepest path depth reached in this subtree, relative to the tree root
    pub fn max_depth(&self) -> usize {
        let mut max = self.path.depth();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            max = max.max(node.path.depth());
            stack.extend(node.children());
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &str, value: &str) -> ConfigNode {
        ConfigNode::scalar(ConfigPath::from_segments([key]), value)
    }

    #[test]
    fn test_constructors_repath_children() {
        let iface = ConfigNode::keyed_map(
            ConfigPath::from_segments(["interface Gi0/1"]),
            [leaf("description", "uplink"), leaf("mtu", "9000")],
        );
        let root = ConfigNode::keyed_map(ConfigPath::root(), [iface]);

        let mtu = root
            .get(&ConfigPath::from_segments(["interface Gi0/1", "mtu"]))
            .unwrap();
        assert_eq!(mtu.value(), Some("9000"));
        assert_eq!(mtu.path.depth(), 2);
    }

    #[test]
    fn test_unordered_set_sorts_and_dedups() {
        let set = ConfigNode::unordered_set(
            ConfigPath::from_segments(["vlans"]),
            [leaf("30", "30"), leaf("10", "10"), leaf("30", "30")],
        );
        let keys: Vec<&str> = set.children().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["10", "30"]);
    }

    #[test]
    fn test_ordered_list_keeps_order() {
        let list = ConfigNode::ordered_list(
            ConfigPath::from_segments(["acl"]),
            [leaf("permit b", "permit b"), leaf("permit a", "permit a")],
        );
        let keys: Vec<&str> = list.children().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["permit b", "permit a"]);
        assert_eq!(list.kind(), NodeKind::OrderedList);
        assert!(list.child("permit a").is_some());
    }

    #[test]
    fn test_node_count_and_depth() {
        let root = ConfigNode::keyed_map(
            ConfigPath::root(),
            [ConfigNode::keyed_map(
                ConfigPath::from_segments(["system"]),
                [leaf("host-name", "r1")],
            )],
        );
        assert_eq!(root.node_count(), 3);
        assert_eq!(root.max_depth(), 2);
    }
}
