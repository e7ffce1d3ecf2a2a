//! Set algebra between two trees
//!
//! All operations work child by child on matching keys, recurse into common
//! subtrees and build a new tree. Neither operand is modified. Values compare
//! per active type (see [`Value`](crate::Value)), and a valueless node only
//! equals another valueless node. Where both sides hold a key, the result
//! keeps the left side's band.

use crate::node::{Band, Slot};
use crate::Config;
use std::collections::BTreeMap;

/// Child of `map` holding `key`, whichever band it is in
fn matching(map: &BTreeMap<Slot, Config>, key: u32) -> Option<&Config> {
    [Band::Keyed, Band::Appended, Band::Prepended]
        .into_iter()
        .find_map(|band| map.get(&Slot::new(band, key)))
}

impl Config {
    /// Union of both trees
    ///
    /// Keys from either side are kept. Where both sides have a key, `other`'s
    /// own value wins unless it has none.
    pub fn merge(&self, other: &Config) -> Config {
        let mut result = self.shell();
        result.value = if other.exists() {
            other.value()
        } else {
            self.value()
        };

        let ours = self.entries();
        let theirs = other.entries();
        for (slot, a) in ours.iter() {
            let merged = match matching(&theirs, slot.key) {
                Some(b) => a.merge(b),
                None => a.clone(),
            };
            result.children.insert(*slot, merged);
        }
        for (slot, b) in theirs.iter() {
            if matching(&ours, slot.key).is_none() {
                result.children.insert(*slot, b.clone());
            }
        }
        result
    }

    /// What differs between the two trees
    ///
    /// Keeps keys present on only one side and keys whose values differ,
    /// dropping equal leaves. Differing values are taken from `other` unless
    /// it has none. An empty, valueless result means the trees are equal.
    pub fn diff(&self, other: &Config) -> Config {
        let mut result = self.shell();
        let (a_value, b_value) = (self.value(), other.value());
        if a_value != b_value {
            result.value = if b_value.is_null() { a_value } else { b_value };
        }

        let ours = self.entries();
        let theirs = other.entries();
        for (slot, a) in ours.iter() {
            match matching(&theirs, slot.key) {
                Some(b) => {
                    let changed = a.diff(b);
                    if !changed.is_blank() {
                        result.children.insert(*slot, changed);
                    }
                }
                None => {
                    result.children.insert(*slot, a.clone());
                }
            }
        }
        for (slot, b) in theirs.iter() {
            if matching(&ours, slot.key).is_none() {
                result.children.insert(*slot, b.clone());
            }
        }
        result
    }

    /// What both trees agree on
    ///
    /// Keeps keys present on both sides whose values are equal, plus interior
    /// nodes whose subtrees still intersect (without a value if theirs
    /// differ). Valueless children are kept only if they are leaves on both
    /// sides.
    pub fn intersect(&self, other: &Config) -> Config {
        let mut result = self.shell();
        let value = self.value();
        if value == other.value() {
            result.value = value;
        }

        let ours = self.entries();
        let theirs = other.entries();
        for (slot, a) in ours.iter() {
            let Some(b) = matching(&theirs, slot.key) else {
                continue;
            };
            let common = a.intersect(b);
            if !common.is_blank() || (a.is_blank() && b.is_blank()) {
                result.children.insert(*slot, common);
            }
        }
        result
    }
}
