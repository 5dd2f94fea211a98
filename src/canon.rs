//! Canonical identity for configuration trees using BLAKE3.
//!
//! Two digests, both 32-hex-character (128-bit) truncations of a BLAKE3
//! hash over a canonical encoding that sorts mapping keys before hashing,
//! so key insertion order never influences identity. The top-level entry
//! under [`CFG_ID_KEY`] is excluded from both: a tree's own declared
//! identity never feeds its own digest.

use crate::config::{Config, CFG_ID_KEY};
use crate::value::Value;
use blake3::Hasher;

const DIGEST_BYTES: usize = 16;

/// Digest of the tree's key structure only.
///
/// Encodes the sorted key set of every mapping level, recursing into mapping
/// values; scalars and sequences are opaque leaves. Two trees with the same
/// key tree but different leaf values share a shape digest; adding, removing,
/// or renaming any key anywhere changes it.
pub fn shape_digest(cfg: &Config) -> String {
    let mut hasher = Hasher::new();
    encode_shape(cfg, true, &mut hasher);
    finish(hasher)
}

/// Digest of the tree's full content.
///
/// Mappings hash sorted by key, sequences by position, scalars by type and
/// value, so insertion order never matters but any value change does.
pub fn content_digest(cfg: &Config) -> String {
    let mut hasher = Hasher::new();
    encode_content_map(cfg, true, &mut hasher);
    finish(hasher)
}

fn finish(hasher: Hasher) -> String {
    hex::encode(&hasher.finalize().as_bytes()[..DIGEST_BYTES])
}

fn sorted_keys(cfg: &Config, root: bool) -> Vec<&str> {
    let mut keys: Vec<&str> = cfg
        .keys()
        .filter(|key| !(root && *key == CFG_ID_KEY))
        .collect();
    keys.sort_unstable();
    keys
}

fn encode_key(key: &str, hasher: &mut Hasher) {
    // Length prefix (8 bytes, big-endian) keeps key boundaries unambiguous.
    hasher.update(&(key.len() as u64).to_be_bytes());
    hasher.update(key.as_bytes());
}

fn encode_shape(cfg: &Config, root: bool, hasher: &mut Hasher) {
    hasher.update(b"{");
    for key in sorted_keys(cfg, root) {
        encode_key(key, hasher);
        match cfg.get(key) {
            Some(Value::Map(map)) => encode_shape(map, false, hasher),
            // Scalars and sequences alike are leaves for shape purposes.
            _ => {
                hasher.update(b"*");
            }
        }
    }
    hasher.update(b"}");
}

fn encode_content_map(cfg: &Config, root: bool, hasher: &mut Hasher) {
    hasher.update(b"{");
    for key in sorted_keys(cfg, root) {
        encode_key(key, hasher);
        if let Some(value) = cfg.get(key) {
            encode_content(value, hasher);
        }
    }
    hasher.update(b"}");
}

fn encode_content(value: &Value, hasher: &mut Hasher) {
    // Type discriminator first, so e.g. integer 3 and float 3.0 differ.
    match value {
        Value::Null => {
            hasher.update(b"n");
        }
        Value::Bool(value) => {
            hasher.update(b"b");
            hasher.update(&[u8::from(*value)]);
        }
        Value::Int(value) => {
            hasher.update(b"i");
            hasher.update(&value.to_be_bytes());
        }
        Value::Float(value) => {
            hasher.update(b"f");
            hasher.update(&value.to_bits().to_be_bytes());
        }
        Value::Complex(value) => {
            hasher.update(b"c");
            hasher.update(&value.re.to_bits().to_be_bytes());
            hasher.update(&value.im.to_bits().to_be_bytes());
        }
        Value::Str(text) => {
            hasher.update(b"s");
            hasher.update(&(text.len() as u64).to_be_bytes());
            hasher.update(text.as_bytes());
        }
        Value::Seq(seq) => {
            hasher.update(b"[");
            for item in seq.iter() {
                encode_content(item, hasher);
            }
            hasher.update(b"]");
        }
        Value::Map(map) => encode_content_map(map, false, hasher),
    }
}
