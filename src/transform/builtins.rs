//! Built-in transforms.

use super::{TransformFn, TransformRegistry};
use crate::config::Config;
use crate::error::{ResolveError, TreeError};
use crate::value::Value;
use std::collections::HashSet;

/// Seed `registry` with the built-in transforms. The name set is static and
/// unique, so installation bypasses the collision check.
pub(super) fn install(registry: &mut TransformRegistry) {
    let table: &[(TransformFn, &str)] = &[
        (remove_element, "remove_element"),
        (resolve_env, "resolve_env"),
        (copy, "copy"),
        (make_setlike_dict, "make_setlike_dict"),
        (make_keys_upper_case, "make_keys_upper_case"),
        // upper-cased alias so renamed trees can still name the transform
        (make_keys_upper_case, "MAKE_KEYS_UPPER_CASE"),
    ];
    for (function, name) in table {
        registry.table.insert((*name).to_string(), *function);
    }
}

/// Delete the value at dotted path `target`, or `target`'s entry `key` when
/// given. `key` addresses a mapping key or a sequence index.
pub fn remove_element(cfg: &mut Config, kwargs: &Config) -> Result<(), ResolveError> {
    let target = required_str(kwargs, "remove_element", "target")?;
    match kwargs.get("key") {
        None => {
            cfg.remove_path(&target)?;
        }
        Some(Value::Str(key)) => {
            let key = key.clone();
            match cfg.get_path_mut(&target)? {
                Value::Map(map) => {
                    map.remove(&key)?;
                }
                other => {
                    let kind = other.kind();
                    return Err(TreeError::NotAMapping { path: target, kind }.into());
                }
            }
        }
        Some(Value::Int(index)) => {
            let index = usize::try_from(*index).map_err(|_| ResolveError::BadTransformArgs {
                name: "remove_element",
                reason: format!("sequence index {index} is negative"),
            })?;
            match cfg.get_path_mut(&target)? {
                Value::Seq(seq) => {
                    seq.remove(index)?;
                }
                other => {
                    let kind = other.kind();
                    return Err(TreeError::NotASequence { path: target, kind }.into());
                }
            }
        }
        Some(other) => {
            return Err(ResolveError::BadTransformArgs {
                name: "remove_element",
                reason: format!("'key' must be a string or integer, found {}", other.kind()),
            })
        }
    }
    Ok(())
}

/// Recursively replace every string value beginning with `$` by the value
/// of the environment variable named by the rest of the string.
pub fn resolve_env(cfg: &mut Config, _kwargs: &Config) -> Result<(), ResolveError> {
    for (_, value) in cfg.iter_mut() {
        resolve_env_value(value)?;
    }
    Ok(())
}

fn resolve_env_value(value: &mut Value) -> Result<(), ResolveError> {
    match value {
        Value::Str(text) if text.starts_with('$') => {
            let name = text[1..].to_string();
            let resolved =
                std::env::var(&name).map_err(|_| ResolveError::MissingEnvVar { name })?;
            *value = Value::Str(resolved);
        }
        Value::Map(map) => {
            for (_, nested) in map.iter_mut() {
                resolve_env_value(nested)?;
            }
        }
        Value::Seq(seq) => {
            for item in seq.items_mut() {
                resolve_env_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Copy the value at dotted path `src` to dotted path `dest`, creating
/// intermediate mappings along `dest`.
pub fn copy(cfg: &mut Config, kwargs: &Config) -> Result<(), ResolveError> {
    let src = required_str(kwargs, "copy", "src")?;
    let dest = required_str(kwargs, "copy", "dest")?;
    let value = cfg
        .get_path(&src)
        .ok_or(TreeError::KeyNotFound { key: src })?
        .clone();
    cfg.set_path(&dest, value)?;
    Ok(())
}

/// Replace the sequence at each target path with a mapping from the former
/// elements to null: an order-preserving, uniqueness-enforcing set.
pub fn make_setlike_dict(cfg: &mut Config, kwargs: &Config) -> Result<(), ResolveError> {
    let targets = match kwargs.get("targets") {
        Some(Value::Seq(targets)) => targets.clone(),
        Some(other) => {
            return Err(ResolveError::BadTransformArgs {
                name: "make_setlike_dict",
                reason: format!("'targets' must be a sequence of paths, found {}", other.kind()),
            })
        }
        None => {
            return Err(ResolveError::BadTransformArgs {
                name: "make_setlike_dict",
                reason: "'targets' is required".to_string(),
            })
        }
    };
    for target in targets.iter() {
        let path = target
            .as_str()
            .ok_or_else(|| ResolveError::BadTransformArgs {
                name: "make_setlike_dict",
                reason: format!("target paths must be strings, found {}", target.kind()),
            })?;
        let slot = cfg.get_path_mut(path)?;
        let seq = match slot {
            Value::Seq(seq) => seq,
            other => {
                let kind = other.kind();
                return Err(TreeError::NotASequence {
                    path: path.to_string(),
                    kind,
                }
                .into());
            }
        };
        let mut setlike = Config::new();
        for element in seq.iter() {
            match element {
                Value::Str(key) => {
                    setlike.set(key.clone(), Value::Null)?;
                }
                other => {
                    return Err(ResolveError::BadTransformArgs {
                        name: "make_setlike_dict",
                        reason: format!(
                            "sequence elements must be strings to become keys, found {}",
                            other.kind()
                        ),
                    })
                }
            }
        }
        *slot = Value::Map(setlike);
    }
    Ok(())
}

/// Upper-case every key of the mapping (and, with `recursive`, of every
/// nested mapping), preserving entry order. Fails when the upper-cased form
/// of a key already exists as a distinct key.
pub fn make_keys_upper_case(cfg: &mut Config, kwargs: &Config) -> Result<(), ResolveError> {
    let recursive = match kwargs.get("recursive") {
        None => true,
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            return Err(ResolveError::BadTransformArgs {
                name: "make_keys_upper_case",
                reason: format!("'recursive' must be a bool, found {}", other.kind()),
            })
        }
    };
    upper_case_keys(cfg, recursive)
}

fn upper_case_keys(cfg: &mut Config, recursive: bool) -> Result<(), ResolveError> {
    // Check the whole key set before renaming anything.
    let mut upper_keys = HashSet::with_capacity(cfg.len());
    for key in cfg.keys() {
        if !upper_keys.insert(key.to_uppercase()) {
            return Err(ResolveError::KeyCaseConflict {
                key: key.to_string(),
            });
        }
    }
    let renamed = cfg
        .entries_mut()
        .drain(..)
        .map(|(key, value)| (key.to_uppercase(), value))
        .collect();
    *cfg.entries_mut() = renamed;

    if recursive {
        for (_, value) in cfg.iter_mut() {
            if let Value::Map(map) = value {
                upper_case_keys(map, recursive)?;
            }
        }
    }
    Ok(())
}

fn required_str(kwargs: &Config, name: &'static str, field: &str) -> Result<String, ResolveError> {
    match kwargs.get(field) {
        Some(Value::Str(text)) => Ok(text.clone()),
        Some(other) => Err(ResolveError::BadTransformArgs {
            name,
            reason: format!("'{field}' must be a string, found {}", other.kind()),
        }),
        None => Err(ResolveError::BadTransformArgs {
            name,
            reason: format!("'{field}' is required"),
        }),
    }
}
