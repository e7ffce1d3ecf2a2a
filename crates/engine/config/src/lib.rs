//! Hierarchical configuration tree for Crossworld
//!
//! This crate provides:
//! - **Config**: A tree of typed values addressed by string keys, numeric keys
//!   or positional accessors (first, last, random, append, ...)
//! - **Bindings**: Nodes that read and write external variables live
//! - **Text and binary formats**: Human-readable save files and a compact
//!   self-describing encoding
//! - **KDL Reader**: Import engine settings written in KDL
//! - **Set algebra**: merge, diff and intersect between trees
//!
//! # Example
//!
//! ```rust
//! use config::Config;
//!
//! let mut cfg = Config::new();
//! cfg["video"]["width"].set(1920);
//! cfg.find("player/inventory").at(Config::APPEND).set("sword");
//!
//! assert_eq!(cfg["video"]["width"].integer(0), 1920);
//! assert_eq!(cfg.lookup("player/inventory").unwrap().count(), 1);
//!
//! let restored: Config = cfg.to_text().parse().unwrap();
//! assert_eq!(restored, cfg);
//! ```
//!
//! Reading a value that was never written is not an error: the node is
//! created on demand and typed getters return the supplied default.

mod accessor;
mod algebra;
pub mod binary;
mod binding;
mod error;
mod hash;
mod kdl_reader;
mod node;
mod path;
mod search;
mod text;
mod value;

pub use accessor::{Accessor, Selector};
pub use binding::{Binding, Bound, BoundString, Linked, Scalar, DEFAULT_CHANCE};
pub use error::{Error, Result};
pub use hash::hash;
pub use kdl_reader::KdlReader;
pub use node::{Band, Config, Slot, APPEND_FLOOR, PREPEND_FLOOR};
pub use value::Value;
