//! Dual-access configuration tree.
//!
//! [`Config`] is an insertion-ordered mapping node whose entries are
//! reachable through two equivalent surfaces: single-key access (`get`,
//! `set`, `remove`, indexing) and dotted-path access (`get_path`,
//! `set_path`, `remove_path`). Nested mappings are `Config` nodes
//! themselves, recursively, so both surfaces hold at every depth.
//!
//! The container doubles as the freeze engine (`finalize` / `unfinalize`)
//! and the merge engine (`rupdate`).

use crate::canon;
use crate::error::TreeError;
use crate::render;
use crate::value::Value;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use tracing::{debug, trace};

/// Reserved top-level key holding the last-computed shape digest.
pub const CFG_ID_KEY: &str = "_CFG_ID";

/// Reserved key declaring the ordered transform pipeline of a mapping.
pub const TRANSFORM_KEY: &str = "_TRANSFORM";

/// Reserved key listing the base fragments a fragment builds on.
pub const BASE_KEY: &str = "_BASE";

/// Key names that collide with the container's own accessor surface. A tree
/// may never hold an entry under one of these names.
const RESERVED_ACCESSORS: &[&str] = &[
    "contains",
    "contains_path",
    "description",
    "finalize",
    "frozen",
    "get",
    "get_mut",
    "get_path",
    "get_path_mut",
    "identity",
    "init_run_dir",
    "is_empty",
    "iter",
    "keys",
    "len",
    "refresh_identity",
    "remove",
    "remove_path",
    "resolve_bases",
    "resolve_transforms",
    "rupdate",
    "set",
    "set_description",
    "set_path",
    "unfinalize",
];

/// Insertion-ordered mapping node of a configuration tree.
///
/// Mutable by default; [`finalize`](Config::finalize) converts the whole
/// tree to its immutable variant in place and attaches the shape digest
/// under [`CFG_ID_KEY`].
#[derive(Debug, Clone, Default)]
pub struct Config {
    entries: IndexMap<String, Value>,
    frozen: bool,
    description: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Build a tree from key/value pairs, rejecting reserved key names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Config, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut cfg = Config::new();
        for (key, value) in pairs {
            cfg.set(key, value)?;
        }
        Ok(cfg)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn frozen(&self) -> bool {
        self.frozen
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Mutable access to a direct entry. Fails on a finalized tree, since a
    /// mutable borrow would bypass the immutability gate.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Value, TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenAccess {
                key: key.to_string(),
            });
        }
        self.entries.get_mut(key).ok_or_else(|| TreeError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Set a direct entry. The frozen gate is checked before the reserved
    /// name, so mutating a finalized tree always reports the finalization.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, TreeError> {
        let key = key.into();
        let value = value.into();
        if self.frozen {
            return Err(TreeError::FrozenSet {
                key,
                value: value.to_string(),
            });
        }
        check_key(&key)?;
        self.entries.insert(key, value);
        Ok(self)
    }

    /// Remove a direct entry, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Result<Value, TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenRemove {
                key: key.to_string(),
            });
        }
        self.entries
            .shift_remove(key)
            .ok_or_else(|| TreeError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Look up a dotted path, descending through nested mappings.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            None => self.get(path),
            Some((head, rest)) => self.get(head)?.as_map()?.get_path(rest),
        }
    }

    /// Mutable lookup of a dotted path. Fails on finalized trees and when an
    /// intermediate segment holds a non-mapping value.
    pub fn get_path_mut(&mut self, path: &str) -> Result<&mut Value, TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenAccess {
                key: path.to_string(),
            });
        }
        match path.split_once('.') {
            None => self.entries.get_mut(path).ok_or_else(|| TreeError::KeyNotFound {
                key: path.to_string(),
            }),
            Some((head, rest)) => match self.entries.get_mut(head) {
                Some(Value::Map(map)) => map.get_path_mut(rest),
                Some(other) => Err(TreeError::NotAMapping {
                    path: head.to_string(),
                    kind: other.kind(),
                }),
                None => Err(TreeError::KeyNotFound {
                    key: path.to_string(),
                }),
            },
        }
    }

    /// Assign a value at a dotted path, creating intermediate mappings as
    /// needed.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self, TreeError> {
        let value = value.into();
        match path.split_once('.') {
            None => {
                self.set(path, value)?;
            }
            Some((head, rest)) => {
                if self.get(head).is_none() {
                    self.set(head, Config::new())?;
                }
                match self.entries.get_mut(head) {
                    Some(Value::Map(map)) => {
                        map.set_path(rest, value)?;
                    }
                    Some(other) => {
                        let kind = other.kind();
                        return Err(TreeError::NotAMapping {
                            path: head.to_string(),
                            kind,
                        });
                    }
                    None => {
                        return Err(TreeError::KeyNotFound {
                            key: head.to_string(),
                        })
                    }
                }
            }
        }
        Ok(self)
    }

    /// Remove the value at a dotted path.
    pub fn remove_path(&mut self, path: &str) -> Result<Value, TreeError> {
        match path.split_once('.') {
            None => self.remove(path),
            Some((head, rest)) => match self.entries.get_mut(head) {
                Some(Value::Map(map)) => map.remove_path(rest),
                Some(other) => Err(TreeError::NotAMapping {
                    path: head.to_string(),
                    kind: other.kind(),
                }),
                None => Err(TreeError::KeyNotFound {
                    key: path.to_string(),
                }),
            },
        }
    }

    /// Recursively convert the tree to its immutable variant in place, then
    /// compute and attach the shape digest under [`CFG_ID_KEY`]. Finalizing
    /// an already-finalized tree recomputes the identity only. Returns the
    /// receiver for chaining.
    pub fn finalize(&mut self) -> &mut Self {
        self.set_frozen(true);
        let id = canon::shape_digest(self);
        debug!(id, "finalized config");
        self.entries.insert(CFG_ID_KEY.to_string(), Value::Str(id));
        self
    }

    /// Recursively revert the tree to its mutable variant. The identity key
    /// is left attached untouched; a stale value remains visible in the
    /// serialized form until explicitly recomputed.
    pub fn unfinalize(&mut self) -> &mut Self {
        self.set_frozen(false);
        self
    }

    /// The currently attached identity, if any. Not necessarily fresh: a
    /// tree mutated after `unfinalize` keeps its old identity until the next
    /// `finalize` or [`refresh_identity`](Config::refresh_identity).
    pub fn identity(&self) -> Option<&str> {
        self.entries.get(CFG_ID_KEY).and_then(Value::as_str)
    }

    /// Recompute and attach the shape digest without changing the frozen
    /// mode.
    pub fn refresh_identity(&mut self) -> &mut Self {
        let id = canon::shape_digest(self);
        self.entries.insert(CFG_ID_KEY.to_string(), Value::Str(id));
        self
    }

    /// Recursive overlay merge. Entries whose existing and incoming values
    /// are both mappings merge key-by-key; every other combination replaces
    /// the existing value wholesale (sequences are never merged element-wise).
    /// New keys are appended in the overlay's order. Mutates the receiver in
    /// place and returns it.
    pub fn rupdate(&mut self, overlay: Config) -> Result<&mut Self, TreeError> {
        if self.frozen {
            if let Some((key, value)) = overlay.entries.first() {
                return Err(TreeError::FrozenSet {
                    key: key.clone(),
                    value: value.to_string(),
                });
            }
            return Ok(self);
        }
        for (key, incoming) in overlay.entries {
            let incoming = match incoming {
                Value::Map(incoming_map) => {
                    if let Some(Value::Map(existing)) = self.entries.get_mut(&key) {
                        trace!(key, "merging nested mapping");
                        existing.rupdate(incoming_map)?;
                        continue;
                    }
                    Value::Map(incoming_map)
                }
                other => other,
            };
            self.set(key, incoming)?;
        }
        Ok(self)
    }

    /// Free-form description used for run-directory naming. Not part of the
    /// tree data: invisible to digests, serialization, and merging.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        for (_, value) in self.entries.iter_mut() {
            value.set_frozen(frozen);
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(key, value)| (key.as_str(), value))
    }

    pub(crate) fn entries_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.entries
    }
}

fn check_key(key: &str) -> Result<(), TreeError> {
    if RESERVED_ACCESSORS.contains(&key) {
        return Err(TreeError::ReservedKey {
            key: key.to_string(),
            container: "Config",
        });
    }
    Ok(())
}

impl PartialEq for Config {
    /// Structural equality over entries; insertion order, the frozen mode,
    /// and the description do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl std::ops::Index<&str> for Config {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get_path(key)
            .unwrap_or_else(|| panic!("config has no key '{key}'"))
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::to_text(self))
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
