use cfgdrift_core::model::{ConfigNode, ConfigPath, ConfigTree, VendorTag};
use cfgdrift_core::{parse, ParseOptions};
use chrono::{DateTime, TimeZone, Utc};

/// Capture timestamp on the given day of March 2026
#[allow(dead_code)]
pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 2, 0, 0).unwrap()
}

/// Scalar node; parents re-path it under themselves
#[allow(dead_code)]
pub fn leaf(key: &str, value: &str) -> ConfigNode {
    ConfigNode::scalar(ConfigPath::from_segments([key]), value)
}

/// Scalar whose key is its value (list and set elements)
#[allow(dead_code)]
pub fn item(key: &str) -> ConfigNode {
    leaf(key, key)
}

#[allow(dead_code)]
pub fn map(key: &str, children: Vec<ConfigNode>) -> ConfigNode {
    ConfigNode::keyed_map(ConfigPath::from_segments([key]), children)
}

#[allow(dead_code)]
pub fn list(key: &str, items: &[&str]) -> ConfigNode {
    ConfigNode::ordered_list(
        ConfigPath::from_segments([key]),
        items.iter().map(|k| item(k)),
    )
}

#[allow(dead_code)]
pub fn set(key: &str, items: &[&str]) -> ConfigNode {
    ConfigNode::unordered_set(
        ConfigPath::from_segments([key]),
        items.iter().map(|k| item(k)),
    )
}

/// Tree whose root keyed map holds `children`
#[allow(dead_code)]
pub fn tree(vendor: VendorTag, children: Vec<ConfigNode>) -> ConfigTree {
    ConfigTree::new(vendor, at(1), ConfigNode::keyed_map(ConfigPath::root(), children))
}

#[allow(dead_code)]
pub fn ios_tree(children: Vec<ConfigNode>) -> ConfigTree {
    tree(VendorTag::CiscoIos, children)
}

#[allow(dead_code)]
pub fn path(segments: &[&str]) -> ConfigPath {
    ConfigPath::from_segments(segments.iter().copied())
}

/// Parse with the built-in tables and default options
#[allow(dead_code)]
pub fn parse_text(vendor: VendorTag, text: &str) -> ConfigTree {
    parse(text.as_bytes(), vendor, at(1), &ParseOptions::default()).unwrap()
}
