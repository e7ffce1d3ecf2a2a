//! Error types for the config tree

use thiserror::Error;

/// Result type for config tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a config tree
///
/// Missing keys and type mismatches are not errors: accessors create empty
/// nodes and getters fall back to the caller's default.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// KDL parsing error
    #[error("KDL parse error: {0}")]
    Kdl(#[from] kdl::KdlError),

    /// Text format error on a specific line
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Binary stream does not start with the expected magic
    #[error("Invalid magic: expected 0x{expected:08X}, found 0x{found:08X}")]
    InvalidMagic { expected: u32, found: u32 },

    /// Unknown value type tag in a binary stream
    #[error("Invalid type tag: 0x{tag:02X}")]
    InvalidTypeTag { tag: u8 },

    /// Binary stream ended early
    #[error("Truncated data: expected {expected_bytes} bytes, only {available_bytes} available")]
    TruncatedData {
        expected_bytes: usize,
        available_bytes: usize,
    },

    /// Binary stream nests deeper than the decoder allows
    #[error("Recursion limit exceeded: max depth is {max_depth}")]
    RecursionLimit { max_depth: usize },

    /// String payload is not valid UTF-8
    #[error("Invalid UTF-8 in string payload")]
    InvalidUtf8,
}
