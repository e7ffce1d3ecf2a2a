//! Live binding of external variables and typed accessors
//!
//! A bound node reads and writes an externally owned variable instead of its
//! own storage. External variables are shared cells; the node only keeps a
//! `Weak` observer, so it never extends the variable's lifetime. Once the
//! variable is dropped the node falls back to its local copy, which holds the
//! last value written through the node.
//!
//! ```
//! use config::{Bound, Config};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let volume: Bound<f32> = Rc::new(Cell::new(0.0));
//! let mut settings = Config::new();
//! settings.find("audio/volume").bind(&volume, 0.8);
//! assert_eq!(volume.get(), 0.8);
//!
//! volume.set(0.25);
//! assert_eq!(settings.find("audio/volume").real(1.0), 0.25);
//! ```
//!
//! # Linked trees
//!
//! [`Config::bind_tree`] links a node to a node owned elsewhere. The linked
//! node is the real storage: `at`, `find` and `pop` resolve inside it and
//! create or remove children there, values are read and written through it,
//! and printing, encoding, cloning and set algebra see its content. The
//! linked node's children are reached through local views, rebuilt on every
//! mutable access and by [`Config::refresh`]. A child added directly to the
//! linked node shows up in `get` and `lookup` after the next rebuild; values
//! are always live.

use crate::node::Slot;
use crate::{Config, Value};
use rand::Rng;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Externally owned scalar that a node can bind to
pub type Bound<T> = Rc<Cell<T>>;

/// Externally owned string that a node can bind to
pub type BoundString = Rc<RefCell<String>>;

/// Externally owned node that another node can link to
pub type Linked = Rc<RefCell<Config>>;

/// Conventional default to pass to [`Config::chance`] when a node may be
/// missing
pub const DEFAULT_CHANCE: i32 = 50;

/// Non-owning reference from a node to the variable backing it
#[derive(Debug, Clone)]
pub enum Binding {
    Bool(Weak<Cell<bool>>),
    Char(Weak<Cell<u8>>),
    Int(Weak<Cell<i32>>),
    Float(Weak<Cell<f32>>),
    UInt(Weak<Cell<u32>>),
    String(Weak<RefCell<String>>),
    /// Node at `path` below a linked root
    Tree {
        root: Weak<RefCell<Config>>,
        path: Vec<u32>,
    },
}

impl Binding {
    /// Current value of the bound variable, `None` once it has been dropped
    pub fn read(&self) -> Option<Value> {
        match self {
            Binding::Bool(var) => var.upgrade().map(|v| Value::Bool(v.get())),
            Binding::Char(var) => var.upgrade().map(|v| Value::Char(v.get())),
            Binding::Int(var) => var.upgrade().map(|v| Value::Int(v.get())),
            Binding::Float(var) => var.upgrade().map(|v| Value::Float(v.get())),
            Binding::UInt(var) => var.upgrade().map(|v| Value::UInt(v.get())),
            Binding::String(var) => var.upgrade().map(|v| Value::String(v.borrow().clone())),
            Binding::Tree { root, path } => {
                let root = root.upgrade()?;
                let tree = root.borrow();
                tree.descend(path).map(Config::value)
            }
        }
    }

    /// Store `value` in the bound variable, converted to its type
    ///
    /// Returns the value as stored, or `None` if the variable is gone or the
    /// value cannot be represented in it.
    pub fn write(&self, value: &Value) -> Option<Value> {
        match self {
            Binding::Bool(var) => {
                let (var, b) = (var.upgrade()?, value.as_bool()?);
                var.set(b);
                Some(Value::Bool(b))
            }
            Binding::Char(var) => {
                let (var, c) = (var.upgrade()?, value.as_char()?);
                var.set(c);
                Some(Value::Char(c))
            }
            Binding::Int(var) => {
                let (var, i) = (var.upgrade()?, value.as_i32()?);
                var.set(i);
                Some(Value::Int(i))
            }
            Binding::Float(var) => {
                let (var, f) = (var.upgrade()?, value.as_f32()?);
                var.set(f);
                Some(Value::Float(f))
            }
            Binding::UInt(var) => {
                let (var, u) = (var.upgrade()?, value.as_u32()?);
                var.set(u);
                Some(Value::UInt(u))
            }
            Binding::String(var) => {
                let var = var.upgrade()?;
                let s = value.to_display_string();
                var.replace(s.clone());
                Some(Value::String(s))
            }
            Binding::Tree { root, path } => {
                let root = root.upgrade()?;
                let mut tree = root.borrow_mut();
                let stored = tree.descend_mut(path).set(value.clone()).value();
                Some(stored)
            }
        }
    }
}

/// Native scalar types a node can bind to
pub trait Scalar: Copy + Into<Value> {
    /// Build the observer for a bound variable of this type
    fn observe(var: &Bound<Self>) -> Binding;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn observe(var: &Bound<Self>) -> Binding {
                    Binding::$variant(Rc::downgrade(var))
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    u8 => Char,
    i32 => Int,
    f32 => Float,
    u32 => UInt,
}

impl Config {
    /// Bind this node to an external scalar and write `default` into it
    pub fn bind<T: Scalar>(&mut self, var: &Bound<T>, default: T) -> &mut Self {
        var.set(default);
        self.value = default.into();
        self.binding = Some(T::observe(var));
        self
    }

    /// Bind this node to an external string and write `default` into it
    ///
    /// The node never owns the string; the caller keeps the `Rc`.
    pub fn bind_string(&mut self, var: &BoundString, default: &str) -> &mut Self {
        var.replace(default.to_string());
        self.value = Value::from(default);
        self.binding = Some(Binding::String(Rc::downgrade(var)));
        self
    }

    /// Link this node to another node, which becomes its effective storage
    ///
    /// Any local children are replaced by views of the linked node's
    /// children. See the [module docs](self) for what goes through the link.
    pub fn bind_tree(&mut self, linked: &Linked) -> &mut Self {
        self.value = linked.borrow().value();
        self.binding = Some(Binding::Tree {
            root: Rc::downgrade(linked),
            path: Vec::new(),
        });
        self.sync_link();
        self
    }

    /// Drop the binding, keeping the last value as a local copy
    ///
    /// A linked node keeps a detached copy of the linked children.
    pub fn unbind(&mut self) -> &mut Self {
        if self.is_linked() {
            self.children = self.entries().into_owned();
        }
        if let Some(binding) = self.binding.take() {
            if let Some(last) = binding.read() {
                self.value = last;
            }
        }
        self
    }

    /// The active binding, if any
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Root of the tree this node is linked into with [`Config::bind_tree`]
    pub fn linked(&self) -> Option<Linked> {
        match &self.binding {
            Some(Binding::Tree { root, .. }) => root.upgrade(),
            _ => None,
        }
    }

    /// Whether reads and writes of children go to a live linked tree
    pub(crate) fn is_linked(&self) -> bool {
        matches!(&self.binding, Some(Binding::Tree { root, .. }) if root.strong_count() > 0)
    }

    /// Rebuild the views of every linked node in this subtree
    pub fn refresh(&mut self) {
        if self.is_linked() {
            self.sync_link();
        } else {
            self.children_mut().for_each(Config::refresh);
        }
    }

    /// Run `f` on the node this one is linked to
    pub(crate) fn with_target<T>(&self, f: impl FnOnce(&Config) -> T) -> Option<T> {
        let Some(Binding::Tree { root, path }) = &self.binding else {
            return None;
        };
        let root = root.upgrade()?;
        let tree = root.borrow();
        let result = f(tree.descend(path)?);
        Some(result)
    }

    /// Run `f` on the node this one is linked to, creating it if it was
    /// removed from the linked tree
    pub(crate) fn with_target_mut<T>(&self, f: impl FnOnce(&mut Config) -> T) -> Option<T> {
        let Some(Binding::Tree { root, path }) = &self.binding else {
            return None;
        };
        let root = root.upgrade()?;
        let mut tree = root.borrow_mut();
        let result = f(tree.descend_mut(path));
        Some(result)
    }

    /// Replace local children with views of the linked node's children
    pub(crate) fn sync_link(&mut self) {
        let Some(Binding::Tree { root, path }) = &self.binding else {
            return;
        };
        let (root, mut prefix) = (root.clone(), path.clone());
        if let Some(children) = self.with_target(|target| mirror(target, &root, &mut prefix)) {
            self.children = children;
        }
    }

    fn descend(&self, path: &[u32]) -> Option<&Config> {
        path.iter().try_fold(self, |node, key| node.child(*key))
    }

    fn descend_mut(&mut self, path: &[u32]) -> &mut Config {
        path.iter().fold(self, |node, key| node.at(*key))
    }

    /// Set the value, writing through to bound storage if bound
    pub fn set(&mut self, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let stored = match &self.binding {
            Some(binding) => binding.write(&value).or_else(|| {
                tracing::debug!(
                    "cannot store {} in bound variable of key {:#010x}, keeping it locally",
                    value.type_name(),
                    self.key
                );
                None
            }),
            None => None,
        };
        self.value = stored.unwrap_or(value);
        self
    }

    /// Parse `text` and store it with the narrowest matching type
    pub fn set_text(&mut self, text: &str) -> &mut Self {
        self.set(Value::parse_literal(text))
    }

    /// Value if the node exists, `None` if it would fall back to a default
    fn raw(&self) -> Option<Value> {
        match self.value() {
            Value::Null => None,
            v => Some(v),
        }
    }

    /// Value as bool, or `default`
    pub fn boolean(&self, default: bool) -> bool {
        self.raw().and_then(|v| v.as_bool()).unwrap_or(default)
    }

    /// Value as i32, or `default`
    pub fn integer(&self, default: i32) -> i32 {
        self.raw().and_then(|v| v.as_i32()).unwrap_or(default)
    }

    /// Value as f32, or `default`
    pub fn real(&self, default: f32) -> f32 {
        self.raw().and_then(|v| v.as_f32()).unwrap_or(default)
    }

    /// Value as u32, or `default`
    pub fn uint32(&self, default: u32) -> u32 {
        self.raw().and_then(|v| v.as_u32()).unwrap_or(default)
    }

    /// Value as a single byte character, or `default`
    pub fn character(&self, default: u8) -> u8 {
        self.raw().and_then(|v| v.as_char()).unwrap_or(default)
    }

    /// Value as text, or `default`
    ///
    /// Non-string values are formatted (`5`, `2.5`, `true`).
    pub fn string(&self, default: &str) -> String {
        self.raw()
            .map(|v| v.to_display_string())
            .unwrap_or_else(|| default.to_string())
    }

    /// Value as a percentage clamped to `0..=100`
    pub fn percentage(&self, default: i32) -> i32 {
        self.integer(default).clamp(0, 100)
    }

    /// Random draw that succeeds with the stored percentage
    pub fn chance(&self, default: i32) -> bool {
        self.chance_with(&mut rand::rng(), default)
    }

    /// [`Config::chance`] with a caller-supplied random source
    pub fn chance_with<R: Rng>(&self, rng: &mut R, default: i32) -> bool {
        rng.random_range(0..100) < self.percentage(default)
    }
}

/// Views of `target`'s children, each linked to its counterpart below `root`
fn mirror(
    target: &Config,
    root: &Weak<RefCell<Config>>,
    path: &mut Vec<u32>,
) -> BTreeMap<Slot, Config> {
    target
        .children
        .values()
        .map(|child| {
            path.push(child.key);
            let view = Config {
                key: child.key,
                band: child.band,
                name: child.name.clone(),
                value: child.value(),
                binding: Some(Binding::Tree {
                    root: root.clone(),
                    path: path.clone(),
                }),
                children: mirror(child, root, path),
            };
            path.pop();
            (child.slot(), view)
        })
        .collect()
}
