//! Depth-first value search
//!
//! A node linked with [`Config::bind_tree`] is searched through the linked
//! tree.

use crate::{Config, Value};

impl Config {
    /// First descendant, depth first in sibling order, whose value equals
    /// `query` exactly (same type, same value)
    pub fn search(&self, query: &Value) -> Option<&Config> {
        self.search_by(&|value: &Value| value == query)
    }

    /// First numeric descendant within `threshold` of `target`
    pub fn search_real(&self, target: f32, threshold: f32) -> Option<&Config> {
        self.search_by(&|value: &Value| match value {
            Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Char(_) => value
                .as_f32()
                .is_some_and(|v| (v - target).abs() <= threshold),
            _ => false,
        })
    }

    /// First descendant holding the string `query`
    pub fn search_str(&self, query: &str) -> Option<&Config> {
        self.search_by(&|value: &Value| value.as_str() == Some(query))
    }

    fn search_by(&self, matches: &dyn Fn(&Value) -> bool) -> Option<&Config> {
        for child in self.children() {
            if child.exists() && matches(&child.value()) {
                return Some(child);
            }
            if let Some(found) = child.search_by(matches) {
                return Some(found);
            }
        }
        None
    }
}
