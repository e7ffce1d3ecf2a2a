//! String to key hashing
//!
//! Every string key is reduced to a 32-bit FNV-1a hash. The function is fixed
//! so that keys written by one run are found again by the next one.
//!
//! Two different strings may hash to the same key. There is no collision
//! resolution: both names address the same child, and the last write wins.
//! Numeric keys share the same 32-bit space, so a caller-chosen integer can
//! also alias a string's hash.

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hash a string key to its 32-bit child key
///
/// `const` so keys can be computed at compile time:
///
/// ```
/// const PLAYER: u32 = config::hash("player");
/// assert_eq!(PLAYER, config::hash("player"));
/// ```
pub const fn hash(key: &str) -> u32 {
    let bytes = key.as_bytes();
    let mut h = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        h ^= bytes[i] as u32;
        h = h.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    h
}
