//! Config node storage
//!
//! A [`Config`] is one node of the data tree: an optional value (local or
//! bound to an external variable) plus an ordered collection of children.
//! Children are owned by their parent and stored in a `BTreeMap` keyed by
//! [`Slot`], which gives the sibling order every positional accessor uses.

use crate::binding::Binding;
use crate::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// First key of the PREPEND band
pub const PREPEND_FLOOR: u32 = 0xE000_0000;

/// First key of the APPEND band
pub const APPEND_FLOOR: u32 = 0xF000_0000;

/// Which part of the sibling order a child belongs to
///
/// The band is fixed when the child is created. Children made by `APPEND`
/// and `PREPEND` get their own band; every child reached by string or
/// numeric key is `Keyed`, whatever its key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    /// Created by PREPEND, sorted before everything else
    Prepended,
    /// Reached by string hash or caller-supplied integer
    Keyed,
    /// Created by APPEND, sorted after everything else
    Appended,
}

/// Sort position of a child: band first, then key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub band: Band,
    pub key: u32,
}

impl Slot {
    pub fn new(band: Band, key: u32) -> Self {
        Self { band, key }
    }

    pub fn keyed(key: u32) -> Self {
        Self::new(Band::Keyed, key)
    }
}

/// A node in the config tree
#[derive(Debug)]
pub struct Config {
    /// Key among siblings (0 for a root)
    pub(crate) key: u32,
    /// Sibling band, fixed at creation
    pub(crate) band: Band,
    /// Original string if the key is a string hash
    pub(crate) name: Option<String>,
    /// Node-local value; mirrors the last value written while bound
    pub(crate) value: Value,
    /// Live link to an external variable
    pub(crate) binding: Option<Binding>,
    /// Owned children in sibling order
    pub(crate) children: BTreeMap<Slot, Config>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new empty root node
    pub fn new() -> Self {
        Self::with_key(Band::Keyed, 0, None)
    }

    pub(crate) fn with_key(band: Band, key: u32, name: Option<String>) -> Self {
        Self {
            key,
            band,
            name,
            value: Value::Null,
            binding: None,
            children: BTreeMap::new(),
        }
    }

    /// Same key and name, no value and no children
    pub(crate) fn shell(&self) -> Self {
        Self::with_key(self.band, self.key, self.name.clone())
    }

    pub(crate) fn slot(&self) -> Slot {
        Slot::new(self.band, self.key)
    }

    /// String identifier of this node, if it was keyed by a string
    pub fn key(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Numeric key of this node among its siblings
    pub fn numeric_key(&self) -> u32 {
        self.key
    }

    /// Band this node was created in
    pub fn band(&self) -> Band {
        self.band
    }

    /// Whether the node holds a value or is bound
    pub fn exists(&self) -> bool {
        self.binding.is_some() || !self.value.is_null()
    }

    /// Whether the node is bound to an external variable
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether the node has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children
    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Neither a value nor children
    pub(crate) fn is_blank(&self) -> bool {
        !self.exists() && self.is_empty()
    }

    /// Current value, read through the binding if there is one
    pub fn value(&self) -> Value {
        self.binding
            .as_ref()
            .and_then(Binding::read)
            .unwrap_or_else(|| self.value.clone())
    }

    /// Direct children in sibling order
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &Config> + ExactSizeIterator {
        self.children.values()
    }

    /// Mutable direct children in sibling order
    pub fn children_mut(
        &mut self,
    ) -> impl DoubleEndedIterator<Item = &mut Config> + ExactSizeIterator {
        self.children.values_mut()
    }

    /// Keys of the direct children in sibling order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = u32> + ExactSizeIterator + '_ {
        self.children.keys().map(|slot| slot.key)
    }

    /// Slot of the child holding `key`, whichever band it was created in
    ///
    /// Keys are unique among siblings across all bands.
    pub(crate) fn find_slot(&self, key: u32) -> Option<Slot> {
        [Band::Keyed, Band::Appended, Band::Prepended]
            .into_iter()
            .map(|band| Slot::new(band, key))
            .find(|slot| self.children.contains_key(slot))
    }

    /// Child with this exact key, if present
    pub fn child(&self, key: u32) -> Option<&Config> {
        self.children.get(&self.find_slot(key)?)
    }

    /// Mutable child with this exact key, if present
    pub fn child_mut(&mut self, key: u32) -> Option<&mut Config> {
        let slot = self.find_slot(key)?;
        self.children.get_mut(&slot)
    }

    /// Get the child holding `slot.key`, or create it in `slot.band`
    ///
    /// A string name is recorded the first time a keyed child is reached
    /// by name.
    pub(crate) fn vivify(&mut self, slot: Slot, name: Option<&str>) -> &mut Config {
        let slot = self.find_slot(slot.key).unwrap_or(slot);
        let child = self
            .children
            .entry(slot)
            .or_insert_with(|| Config::with_key(slot.band, slot.key, None));
        if child.name.is_none() && child.band == Band::Keyed {
            child.name = name.map(str::to_owned);
        }
        child
    }

    /// Insert a finished child, replacing any sibling with the same key
    pub(crate) fn adopt(&mut self, child: Config) {
        if let Some(old) = self.find_slot(child.key) {
            self.children.remove(&old);
        }
        self.children.insert(child.slot(), child);
    }

    /// Insert `node` as a child, folding it into an existing child with the
    /// same key the way repeated accessor writes would
    pub(crate) fn graft(&mut self, node: Config) {
        let Config {
            key,
            band,
            name,
            value,
            children,
            ..
        } = node;
        let target = self.vivify(Slot::new(band, key), name.as_deref());
        if !value.is_null() {
            target.set(value);
        }
        for (_, child) in children {
            target.graft(child);
        }
    }

    /// Children as seen by codecs and set algebra
    ///
    /// For a node linked to another tree this is the linked node's children.
    pub(crate) fn entries(&self) -> Cow<'_, BTreeMap<Slot, Config>> {
        match self.with_target(|target| target.entries().into_owned()) {
            Some(children) => Cow::Owned(children),
            None => Cow::Borrowed(&self.children),
        }
    }

    /// Remove all children and reset the value
    ///
    /// A binding is dropped as well; the external variable keeps its value.
    pub fn clear(&mut self) {
        self.children.clear();
        self.binding = None;
        self.value = Value::Null;
    }

    /// Detach the child with this exact key
    pub fn take(&mut self, key: u32) -> Option<Config> {
        if self.is_linked() {
            let taken = self.with_target_mut(|target| target.take(key)).flatten();
            self.sync_link();
            return taken;
        }
        let slot = self.find_slot(key)?;
        self.children.remove(&slot)
    }
}

/// Deep copy of values and structure
///
/// Bindings are never copied: the copy holds the bound variable's current
/// value in local storage. A node linked to another tree copies the linked
/// node's content.
impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            band: self.band,
            name: self.name.clone(),
            value: self.value(),
            binding: None,
            children: self.entries().into_owned(),
        }
    }
}

/// Structural equality: keys, bands, names, current values and children
impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.band == other.band
            && self.name == other.name
            && self.value() == other.value()
            && *self.entries() == *other.entries()
    }
}
