//! Loading serialized trees.
//!
//! The file-format collaborator is `serde_yaml`: serialized text parses
//! into a native YAML value which is then lifted into the tree model.
//! Strings shaped like the serializer's complex-number literal (`2+3j`)
//! are lifted back into complex scalars, and an embedded identity key is
//! verified against the freshly computed shape digest before it is
//! detached again.

use crate::canon;
use crate::config::{Config, CFG_ID_KEY};
use crate::error::ResolveError;
use crate::value::{Complex, Sequence, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

impl Config {
    /// Parse a tree from serialized text and verify its embedded identity,
    /// if any. The identity entry is detached after verification; the next
    /// [`finalize`](Config::finalize) reattaches a fresh one.
    pub fn from_yaml_str(text: &str) -> Result<Config, ResolveError> {
        let raw: serde_yaml::Value = serde_yaml::from_str(text)?;
        let mut cfg = match from_yaml(raw)? {
            Value::Map(map) => map,
            other => {
                return Err(ResolveError::DocumentNotMapping {
                    kind: other.kind(),
                })
            }
        };
        verify_identity(&mut cfg)?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ResolveError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config file");
        let text = fs::read_to_string(path)?;
        Config::from_yaml_str(&text)
    }

    /// Full loading pipeline: parse and verify, expand base fragments, then
    /// run declared transforms.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ResolveError> {
        let mut cfg = Config::from_file(path)?;
        cfg.resolve_bases()?;
        cfg.resolve_transforms()?;
        Ok(cfg)
    }
}

fn verify_identity(cfg: &mut Config) -> Result<(), ResolveError> {
    if !cfg.contains(CFG_ID_KEY) {
        return Ok(());
    }
    let declared = match cfg.remove(CFG_ID_KEY)? {
        Value::Str(text) => text,
        other => {
            return Err(ResolveError::InvalidIdentityValue {
                found: other.to_string(),
            })
        }
    };
    let computed = canon::shape_digest(cfg);
    if declared != computed {
        return Err(ResolveError::IdentityMismatch { declared, computed });
    }
    Ok(())
}

/// Lift a native YAML value into the tree model.
pub(crate) fn from_yaml(raw: serde_yaml::Value) -> Result<Value, ResolveError> {
    Ok(match raw {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(value) => Value::Bool(value),
        serde_yaml::Value::Number(number) => match number.as_i64() {
            Some(int) => Value::Int(int),
            None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        serde_yaml::Value::String(text) => match Complex::parse(&text) {
            Some(complex) => Value::Complex(complex),
            None => Value::Str(text),
        },
        serde_yaml::Value::Sequence(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(from_yaml(item)?);
            }
            Value::Seq(Sequence::from_values(values))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut cfg = Config::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(key) => key,
                    other => {
                        return Err(ResolveError::NonStringKey {
                            found: format!("{other:?}"),
                        })
                    }
                };
                let value = from_yaml(value)?;
                cfg.set(key, value)?;
            }
            Value::Map(cfg)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}
