use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::node::ConfigNode;
use super::path::ConfigPath;
use crate::digest::compute_node_digest;
use crate::errors::Result;

/// Supported device platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorTag {
    CiscoIos,
    AristaEos,
    Junos,
    F5Bigip,
    Panos,
    Meraki,
}

/// Raw configuration syntax a vendor exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxFamily {
    /// Indentation-nested CLI (`show running-config`)
    IndentedCli,
    /// Curly-brace hierarchy (`show configuration`, `tmsh list`)
    BracedCli,
    /// JSON documents returned by a REST API
    Json,
}

impl VendorTag {
    pub const ALL: [VendorTag; 6] = [
        VendorTag::CiscoIos,
        VendorTag::AristaEos,
        VendorTag::Junos,
        VendorTag::F5Bigip,
        VendorTag::Panos,
        VendorTag::Meraki,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorTag::CiscoIos => "cisco_ios",
            VendorTag::AristaEos => "arista_eos",
            VendorTag::Junos => "junos",
            VendorTag::F5Bigip => "f5_bigip",
            VendorTag::Panos => "panos",
            VendorTag::Meraki => "meraki",
        }
    }

    pub fn syntax(&self) -> SyntaxFamily {
        match self {
            VendorTag::CiscoIos | VendorTag::AristaEos => SyntaxFamily::IndentedCli,
            VendorTag::Junos | VendorTag::F5Bigip => SyntaxFamily::BracedCli,
            VendorTag::Panos | VendorTag::Meraki => SyntaxFamily::Json,
        }
    }
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cisco_ios" | "ios" | "ios_xe" => Ok(VendorTag::CiscoIos),
            "arista_eos" | "eos" => Ok(VendorTag::AristaEos),
            "junos" | "juniper" => Ok(VendorTag::Junos),
            "f5_bigip" | "f5" | "bigip" => Ok(VendorTag::F5Bigip),
            "panos" | "pan_os" | "paloalto" => Ok(VendorTag::Panos),
            "meraki" => Ok(VendorTag::Meraki),
            other => Err(format!("unknown vendor '{}'", other)),
        }
    }
}

/// Identity of a tree as referenced by comparison results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeIdentity {
    pub vendor: VendorTag,
    pub captured_at: DateTime<Utc>,
    /// SHA-256 of the canonical root encoding
    pub digest: String,
}

/// A normalized configuration: root node, vendor and capture time.
///
/// Immutable once built; the root is always at the root path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTree {
    vendor: VendorTag,
    captured_at: DateTime<Utc>,
    root: ConfigNode,
}

impl ConfigTree {
    pub fn new(vendor: VendorTag, captured_at: DateTime<Utc>, root: ConfigNode) -> Self {
        let root = if root.path.is_root() {
            root
        } else {
            root.with_path(ConfigPath::root())
        };
        Self {
            vendor,
            captured_at,
            root,
        }
    }

    pub fn vendor(&self) -> VendorTag {
        self.vendor
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    pub fn get(&self, path: &ConfigPath) -> Option<&ConfigNode> {
        self.root.get(path)
    }

    /// Vendor, capture time and content digest
    ///
    /// # Errors
    ///
    /// Returns `DriftError::Serialization` if the root cannot be encoded.
    pub fn identity(&self) -> Result<TreeIdentity> {
        Ok(TreeIdentity {
            vendor: self.vendor,
            captured_at: self.captured_at,
            digest: compute_node_digest(&self.root)?,
        })
    }
}
