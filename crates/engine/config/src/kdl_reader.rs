//! KDL configuration file reader
//!
//! Engine settings are often written in KDL. This reader loads them into a
//! config tree so they can be merged with, or saved as, the native formats.
//!
//! # KDL Mapping
//!
//! - Node name becomes a string key
//! - A single argument becomes the node value
//! - Several arguments become children keyed `0, 1, 2, ...`
//! - Properties become string-keyed children holding their value
//! - Child nodes become child nodes
//!
//! # Example
//!
//! ```kdl
//! app {
//!     scene {
//!         world macro_depth=3 micro_depth=5 seed=12345
//!     }
//! }
//! ```
//!
//! Maps to paths `app/scene/world/macro_depth`, `app/scene/world/micro_depth`
//! and `app/scene/world/seed`.

use crate::{Accessor, Config, Result, Value};
use std::path::Path;

/// KDL configuration reader
pub struct KdlReader;

impl KdlReader {
    /// Parse a KDL file into a config tree
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("reading KDL config from {}", path.display());
        Self::from_string(&content)
    }

    /// Parse a KDL string into a config tree
    pub fn from_string(content: &str) -> Result<Config> {
        let doc: kdl::KdlDocument = content.parse()?;

        let mut root = Config::new();
        for node in doc.nodes() {
            Self::parse_node(node, root.at(node.name().value()));
        }
        Ok(root)
    }

    /// Fill `target` from a KDL node
    fn parse_node(node: &kdl::KdlNode, target: &mut Config) {
        let (args, props): (Vec<&kdl::KdlEntry>, Vec<&kdl::KdlEntry>) =
            node.entries().iter().partition(|e| e.name().is_none());

        // Set node value from arguments
        match args.as_slice() {
            [] => {}
            [single] => {
                target.set(Self::kdl_value_to_value(single.value()));
            }
            many => {
                for arg in many {
                    target
                        .at(Accessor::Next)
                        .set(Self::kdl_value_to_value(arg.value()));
                }
            }
        }

        // Properties become keyed children
        for prop in props {
            if let Some(name) = prop.name() {
                target
                    .at(name.value())
                    .set(Self::kdl_value_to_value(prop.value()));
            }
        }

        // Parse children recursively
        if let Some(children) = node.children() {
            for child_node in children.nodes() {
                Self::parse_node(child_node, target.at(child_node.name().value()));
            }
        }
    }

    /// Convert a KDL value to our Value type
    fn kdl_value_to_value(kdl_val: &kdl::KdlValue) -> Value {
        match kdl_val {
            kdl::KdlValue::String(s) => Value::String(s.clone()),
            kdl::KdlValue::Integer(i) => {
                if let Ok(i) = i32::try_from(*i) {
                    Value::Int(i)
                } else if let Ok(u) = u32::try_from(*i) {
                    Value::UInt(u)
                } else {
                    Value::Float(*i as f32)
                }
            }
            kdl::KdlValue::Float(f) => Value::Float(*f as f32),
            kdl::KdlValue::Bool(b) => Value::Bool(*b),
            kdl::KdlValue::Null => Value::Null,
        }
    }
}

impl Config {
    /// Parse a KDL string into a config tree
    pub fn from_kdl_str(content: &str) -> Result<Config> {
        KdlReader::from_string(content)
    }

    /// Parse a KDL file into a config tree
    pub fn from_kdl_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        KdlReader::from_file(path)
    }
}
