//! Path access
//!
//! A path is a `/`-separated list of string keys (`"world/terrain/seed"`).
//! Empty segments are ignored, so leading, trailing and doubled slashes are
//! harmless.

use crate::Config;

impl Config {
    /// Walk `path` from this node, creating missing nodes on the way
    ///
    /// Equivalent to indexing with each segment in turn.
    pub fn find(&mut self, path: &str) -> &mut Config {
        let mut node = self;
        for segment in segments(path) {
            node = node.at(segment);
        }
        node
    }

    /// Walk `path` without creating anything
    pub fn lookup(&self, path: &str) -> Option<&Config> {
        segments(path).try_fold(self, |node, segment| node.get(segment))
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
