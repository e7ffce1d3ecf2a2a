//! Child selection and creation
//!
//! Children are reached by string key (hashed), by numeric key, or by an
//! [`Accessor`] token that picks a position in the current sibling order or
//! allocates a fresh key. Reaching a child that does not exist creates it.
//!
//! # Key allocation
//!
//! Sibling order is band first, then key (see [`Band`]). `APPEND` creates
//! its child in the append band with a key above every appended key so far,
//! so appended children sort after keyed and prepended ones, in call order,
//! no matter which string keys are added later. `PREPEND` counts down
//! through the prepend band the same way. Appended keys start at
//! [`APPEND_FLOOR`], prepended keys just below it, and `NEXT` stays below
//! [`PREPEND_FLOOR`]. Running out is a program error and panics.
//!
//! Numeric keys share one namespace across bands: reaching a key that an
//! `APPEND` child already holds returns that child.

use crate::hash::hash;
use crate::node::{Band, Slot, APPEND_FLOOR, PREPEND_FLOOR};
use crate::Config;
use rand::Rng;
use std::ops::{Index, IndexMut};

/// Positional and allocating accessor tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Child with the lowest sort position
    First,
    /// Child at index `n / 2` of the sibling order
    Middle,
    /// Child with the highest sort position
    Last,
    /// Uniformly random existing child
    Random,
    /// Random existing child weighted by its own numeric value
    Weighted,
    /// New child at the smallest unused non-negative integer key
    Next,
    /// New child sorted after every existing child
    Append,
    /// New child sorted before every existing child
    Prepend,
}

/// What an index into a node refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// String key, hashed to a numeric key
    Name(&'a str),
    /// Numeric key used verbatim
    Key(u32),
    /// Position or allocation directive
    Accessor(Accessor),
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(name: &'a str) -> Self {
        Selector::Name(name)
    }
}

impl<'a> From<&'a String> for Selector<'a> {
    fn from(name: &'a String) -> Self {
        Selector::Name(name.as_str())
    }
}

impl From<u32> for Selector<'_> {
    fn from(key: u32) -> Self {
        Selector::Key(key)
    }
}

impl From<Accessor> for Selector<'_> {
    fn from(accessor: Accessor) -> Self {
        Selector::Accessor(accessor)
    }
}

impl Config {
    pub const FIRST: Accessor = Accessor::First;
    pub const MIDDLE: Accessor = Accessor::Middle;
    pub const LAST: Accessor = Accessor::Last;
    pub const RANDOM: Accessor = Accessor::Random;
    pub const WEIGHTED: Accessor = Accessor::Weighted;
    pub const NEXT: Accessor = Accessor::Next;
    pub const APPEND: Accessor = Accessor::Append;
    pub const PREPEND: Accessor = Accessor::Prepend;

    /// Get or create the selected child
    ///
    /// Positional tokens on a node without children first create one empty
    /// child at key 0.
    ///
    /// # Panics
    ///
    /// If `NEXT`, `APPEND` or `PREPEND` find no free key.
    pub fn at<'a>(&mut self, selector: impl Into<Selector<'a>>) -> &mut Config {
        self.at_with(selector, &mut rand::rng())
    }

    /// [`Config::at`] with a caller-supplied random source for `RANDOM` and
    /// `WEIGHTED`
    pub fn at_with<'a, R: Rng>(
        &mut self,
        selector: impl Into<Selector<'a>>,
        rng: &mut R,
    ) -> &mut Config {
        let selector = selector.into();
        if self.is_linked() {
            return self.at_linked(selector, rng);
        }
        match selector {
            Selector::Name(name) => self.vivify(Slot::keyed(hash(name)), Some(name)),
            Selector::Key(key) => self.vivify(Slot::keyed(key), None),
            Selector::Accessor(accessor) => {
                let slot = match accessor {
                    Accessor::Next => Some(Slot::keyed(self.next_key())),
                    Accessor::Append => Some(Slot::new(Band::Appended, self.append_key())),
                    Accessor::Prepend => Some(Slot::new(Band::Prepended, self.prepend_key())),
                    positional => self.position_key(positional, rng).map(Slot::keyed),
                };
                let slot = slot.unwrap_or_else(|| Slot::keyed(self.next_key()));
                self.vivify(slot, None)
            }
        }
    }

    /// Resolve the selector inside the linked tree and hand back the
    /// matching local view
    fn at_linked<R: Rng>(&mut self, selector: Selector<'_>, rng: &mut R) -> &mut Config {
        let key = self.with_target_mut(|target| target.at_with(selector, &mut *rng).key);
        self.sync_link();
        let slot = match key {
            Some(key) => Slot::keyed(key),
            // The linked tree is gone; fall back to local storage
            None => {
                self.binding = None;
                return self.at_with(selector, rng);
            }
        };
        self.vivify(slot, None)
    }

    /// Look up the selected child without creating anything
    ///
    /// Allocating tokens (`NEXT`, `APPEND`, `PREPEND`) always return `None`.
    pub fn get<'a>(&self, selector: impl Into<Selector<'a>>) -> Option<&Config> {
        let key = self.existing_key(selector.into(), &mut rand::rng())?;
        self.child(key)
    }

    /// Mutable [`Config::get`]
    pub fn get_mut<'a>(&mut self, selector: impl Into<Selector<'a>>) -> Option<&mut Config> {
        let key = self.existing_key(selector.into(), &mut rand::rng())?;
        self.child_mut(key)
    }

    /// Detach the selected child and hand its subtree to the caller
    ///
    /// Dropping the returned node destroys the subtree.
    pub fn pop<'a>(&mut self, selector: impl Into<Selector<'a>>) -> Option<Config> {
        let key = self.existing_key(selector.into(), &mut rand::rng())?;
        self.take(key)
    }

    fn existing_key<R: Rng>(&self, selector: Selector<'_>, rng: &mut R) -> Option<u32> {
        match selector {
            Selector::Name(name) => Some(hash(name)),
            Selector::Key(key) => Some(key),
            Selector::Accessor(Accessor::Next | Accessor::Append | Accessor::Prepend) => None,
            Selector::Accessor(positional) => self.position_key(positional, rng),
        }
    }

    /// Key of an existing child chosen by a positional token
    fn position_key<R: Rng>(&self, accessor: Accessor, rng: &mut R) -> Option<u32> {
        let n = self.children.len();
        if n == 0 {
            return None;
        }
        let index = match accessor {
            Accessor::First => 0,
            Accessor::Last => n - 1,
            Accessor::Middle => n / 2,
            Accessor::Random => rng.random_range(0..n),
            Accessor::Weighted => self.weighted_index(rng),
            Accessor::Next | Accessor::Append | Accessor::Prepend => return None,
        };
        self.keys().nth(index)
    }

    /// Index drawn with probability proportional to each child's value
    ///
    /// Negative and non-numeric values weigh nothing. If every weight is
    /// zero the draw is uniform.
    fn weighted_index<R: Rng>(&self, rng: &mut R) -> usize {
        let weights: Vec<f64> = self
            .children()
            .map(|child| f64::from(child.real(0.0)).max(0.0))
            .map(|w| if w.is_finite() { w } else { 0.0 })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return rng.random_range(0..weights.len());
        }
        let mut target = rng.random_range(0.0..total);
        for (index, weight) in weights.iter().enumerate() {
            if target < *weight {
                return index;
            }
            target -= weight;
        }
        // Rounding left `target` past the last weight
        weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
    }

    /// Smallest non-negative integer not used as a key
    fn next_key(&self) -> u32 {
        let mut used: Vec<u32> = self
            .children
            .keys()
            .map(|slot| slot.key)
            .filter(|key| *key < PREPEND_FLOOR)
            .collect();
        used.sort_unstable();
        match first_gap(&used, PREPEND_FLOOR) {
            Some(key) => key,
            None => panic!("config key space exhausted: no free NEXT key"),
        }
    }

    fn is_free(&self, key: u32) -> bool {
        self.find_slot(key).is_none()
    }

    /// First free key above the last appended child
    fn append_key(&self) -> u32 {
        let start = match self.children.keys().next_back() {
            Some(slot) if slot.band == Band::Appended => slot.key.checked_add(1),
            _ => Some(APPEND_FLOOR),
        };
        let key = start.and_then(|start| (start..=u32::MAX).find(|key| self.is_free(*key)));
        match key {
            Some(key) => key,
            None => panic!("config key space exhausted: no free APPEND key"),
        }
    }

    /// First free key below the first prepended child
    fn prepend_key(&self) -> u32 {
        let start = match self.children.keys().next() {
            Some(slot) if slot.band == Band::Prepended => slot.key.checked_sub(1),
            _ => Some(APPEND_FLOOR - 1),
        };
        let key = start.and_then(|start| (0..=start).rev().find(|key| self.is_free(*key)));
        match key {
            Some(key) => key,
            None => panic!("config key space exhausted: no free PREPEND key"),
        }
    }
}

/// Smallest value below `end` missing from the sorted keys in `used`
fn first_gap(used: &[u32], end: u32) -> Option<u32> {
    let mut candidate = 0u32;
    for &key in used {
        if key > candidate {
            break;
        }
        if key == candidate {
            candidate += 1;
        }
    }
    (candidate < end).then_some(candidate)
}

/// Read access by string key
///
/// # Panics
///
/// If there is no such child, like `HashMap` indexing. Use
/// [`Config::get`] to read without panicking.
impl Index<&str> for Config {
    type Output = Config;

    fn index(&self, name: &str) -> &Config {
        self.get(name)
            .unwrap_or_else(|| panic!("config has no child {:?}", name))
    }
}

/// Write access by string key, creating the child if needed
impl IndexMut<&str> for Config {
    fn index_mut(&mut self, name: &str) -> &mut Config {
        self.at(name)
    }
}

/// Read access by numeric key
///
/// # Panics
///
/// If there is no such child.
impl Index<u32> for Config {
    type Output = Config;

    fn index(&self, key: u32) -> &Config {
        self.child(key)
            .unwrap_or_else(|| panic!("config has no child with key {}", key))
    }
}

/// Write access by numeric key, creating the child if needed
impl IndexMut<u32> for Config {
    fn index_mut(&mut self, key: u32) -> &mut Config {
        self.at(key)
    }
}
