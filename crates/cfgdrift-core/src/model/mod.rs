pub mod delta;
pub mod node;
pub mod path;
pub mod tree;

pub use delta::{Classification, DeltaEntry, DeltaOp, DeltaResult, DeltaSummary};
pub use node::{ConfigNode, NodeBody, NodeKind};
pub use path::ConfigPath;
pub use tree::{ConfigTree, SyntaxFamily, TreeIdentity, VendorTag};
