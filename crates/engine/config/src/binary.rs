//! Binary config format
//!
//! Compact, self-describing encoding of a whole tree. Every node carries its
//! type, so a stream decodes without any schema.
//!
//! # Format
//!
//! ```text
//! [Header: 4 bytes]
//!   Magic: 'CFG1' (0x31474643 little-endian)
//!
//! [Record]
//!   Tag:      1 byte   [N|A|P|0|TTTT]  N = name follows, A = made by
//!             APPEND, P = made by PREPEND, TTTT = value type
//!   Name:     u32 length + UTF-8 bytes (only if N is set)
//!   Payload:  0 bytes (null), 1 byte (bool, char), 4 bytes (int, float,
//!             uint32), or u32 length + UTF-8 bytes (string)
//!   Children: u32 count, then per child its u32 key and its record
//! ```
//!
//! All integers are little-endian. Children are written in sibling order, so
//! decoding reproduces the same keys, bands, names, types and order.

use crate::node::Band;
use crate::{Config, Error, Result, Value};
use std::io::{Read, Write};
use std::path::Path;

/// Binary format constants
pub mod constants {
    /// Magic number: 'CFG1' in ASCII
    pub const MAGIC: u32 = 0x3147_4643;

    /// Header size in bytes
    pub const HEADER_SIZE: usize = 4;

    /// Maximum nesting depth accepted by the decoder
    pub const MAX_RECURSION_DEPTH: usize = 256;

    /// Tag bit set when a name follows the tag
    pub const NAME_FLAG: u8 = 0x80;

    /// Tag bit set on children created by APPEND
    pub const APPENDED_FLAG: u8 = 0x40;

    /// Tag bit set on children created by PREPEND
    pub const PREPENDED_FLAG: u8 = 0x20;

    // Type IDs
    pub const TYPE_NULL: u8 = 0;
    pub const TYPE_BOOL: u8 = 1;
    pub const TYPE_CHAR: u8 = 2;
    pub const TYPE_INT: u8 = 3;
    pub const TYPE_FLOAT: u8 = 4;
    pub const TYPE_UINT: u8 = 5;
    pub const TYPE_STRING: u8 = 6;
}

use constants::*;

fn type_id(value: &Value) -> u8 {
    match value {
        Value::Null => TYPE_NULL,
        Value::Bool(_) => TYPE_BOOL,
        Value::Char(_) => TYPE_CHAR,
        Value::Int(_) => TYPE_INT,
        Value::Float(_) => TYPE_FLOAT,
        Value::UInt(_) => TYPE_UINT,
        Value::String(_) => TYPE_STRING,
    }
}

fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

fn write_record(node: &Config, out: &mut Vec<u8>) {
    let value = node.value();
    let mut tag = type_id(&value);
    if node.name.is_some() {
        tag |= NAME_FLAG;
    }
    match node.band {
        Band::Appended => tag |= APPENDED_FLAG,
        Band::Prepended => tag |= PREPENDED_FLAG,
        Band::Keyed => {}
    }
    out.push(tag);
    if let Some(name) = &node.name {
        write_bytes(out, name.as_bytes());
    }

    match &value {
        Value::Null => {}
        Value::Bool(b) => out.push(*b as u8),
        Value::Char(c) => out.push(*c),
        Value::Int(i) => out.extend_from_slice(&i.to_le_bytes()),
        Value::Float(f) => write_u32(out, f.to_bits()),
        Value::UInt(u) => write_u32(out, *u),
        Value::String(s) => write_bytes(out, s.as_bytes()),
    }

    let children = node.entries();
    write_u32(out, children.len() as u32);
    for child in children.values() {
        write_u32(out, child.key);
        write_record(child, out);
    }
}

/// Decoder state over an in-memory stream
struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::TruncatedData {
                expected_bytes: HEADER_SIZE,
                available_bytes: data.len(),
            });
        }
        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic != MAGIC {
            return Err(Error::InvalidMagic {
                expected: MAGIC,
                found: magic,
            });
        }
        Ok(Self {
            data,
            pos: HEADER_SIZE,
            depth: 0,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(Error::TruncatedData {
                expected_bytes: n,
                available_bytes: available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8)
    }

    fn record(&mut self, key: u32) -> Result<Config> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(Error::RecursionLimit {
                max_depth: MAX_RECURSION_DEPTH,
            });
        }
        self.depth += 1;
        let result = self.record_impl(key);
        self.depth -= 1;
        result
    }

    fn record_impl(&mut self, key: u32) -> Result<Config> {
        let tag = self.u8()?;
        let name = if tag & NAME_FLAG != 0 {
            Some(self.string()?)
        } else {
            None
        };

        let band = match tag & (APPENDED_FLAG | PREPENDED_FLAG) {
            0 => Band::Keyed,
            APPENDED_FLAG => Band::Appended,
            PREPENDED_FLAG => Band::Prepended,
            _ => return Err(Error::InvalidTypeTag { tag }),
        };

        let mut node = Config::with_key(band, key, name);
        node.value = match tag & !(NAME_FLAG | APPENDED_FLAG | PREPENDED_FLAG) {
            TYPE_NULL => Value::Null,
            TYPE_BOOL => Value::Bool(self.u8()? != 0),
            TYPE_CHAR => Value::Char(self.u8()?),
            TYPE_INT => Value::Int(self.u32()? as i32),
            TYPE_FLOAT => Value::Float(f32::from_bits(self.u32()?)),
            TYPE_UINT => Value::UInt(self.u32()?),
            TYPE_STRING => Value::String(self.string()?),
            _ => return Err(Error::InvalidTypeTag { tag }),
        };

        let count = self.u32()?;
        for _ in 0..count {
            let child_key = self.u32()?;
            let child = self.record(child_key)?;
            node.adopt(child);
        }
        Ok(node)
    }
}

impl Config {
    /// Encode the tree into `writer`
    pub fn write_binary<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Decode a tree from `reader`
    pub fn read_binary<R: Read>(mut reader: R) -> Result<Config> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Encode the tree into a byte vector
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        write_record(self, &mut out);
        out
    }

    /// Decode a tree from bytes produced by [`Config::to_bytes`]
    pub fn from_bytes(data: &[u8]) -> Result<Config> {
        let mut decoder = Decoder::new(data)?;
        let root = decoder.record(0)?;
        if decoder.pos < data.len() {
            tracing::debug!(
                "ignoring {} trailing bytes after config record",
                data.len() - decoder.pos
            );
        }
        Ok(root)
    }

    /// Write the tree to a binary file
    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes();
        std::fs::write(path, &bytes)?;
        tracing::debug!("saved {} bytes of config to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Read a binary file
    pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!("loaded {} bytes of config from {}", bytes.len(), path.display());
        Self::from_bytes(&bytes)
    }
}
