//! Transform registry and executor.
//!
//! Transforms are functions registered once, process-wide, under a unique
//! name. Any mapping in a tree may carry a [`TRANSFORM_KEY`] entry holding
//! an ordered list of invocation records; resolution pops each declaration
//! and runs its transforms strictly in declaration order, later transforms
//! observing the effects of earlier ones.

pub mod builtins;

use crate::config::{Config, TRANSFORM_KEY};
use crate::error::ResolveError;
use crate::value::Value;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// A transform receives the mapping where its declaration appeared plus the
/// record's remaining fields as keyword arguments.
pub type TransformFn = fn(&mut Config, &Config) -> Result<(), ResolveError>;

/// Name → function table. The process-wide instance lives behind
/// [`register_transform`]; tests can inject a local instance through
/// [`Config::resolve_transforms_with`].
#[derive(Default)]
pub struct TransformRegistry {
    table: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// An empty registry without the built-in transforms.
    pub fn new() -> Self {
        TransformRegistry::default()
    }

    /// A registry seeded with the built-in transforms.
    pub fn with_builtins() -> Self {
        let mut registry = TransformRegistry::default();
        builtins::install(&mut registry);
        registry
    }

    /// Register `function` under `name`. Names are claimed for the life of
    /// the registry; a second registration under the same name fails.
    pub fn register(&mut self, function: TransformFn, name: &str) -> Result<(), ResolveError> {
        if self.table.contains_key(name) {
            return Err(ResolveError::DuplicateTransform {
                name: name.to_string(),
            });
        }
        debug!(name, "registered transform");
        self.table.insert(name.to_string(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<TransformFn> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

static GLOBAL: Lazy<RwLock<TransformRegistry>> =
    Lazy::new(|| RwLock::new(TransformRegistry::with_builtins()));

/// Register `function` in the process-wide registry. Intended for startup:
/// modules claim their names once, before any tree is resolved.
pub fn register_transform(function: TransformFn, name: &str) -> Result<(), ResolveError> {
    GLOBAL.write().register(function, name)
}

impl Config {
    /// Apply every transform declaration in the tree, in place, using the
    /// process-wide registry. A tree without declarations is left untouched.
    pub fn resolve_transforms(&mut self) -> Result<&mut Self, ResolveError> {
        let registry = GLOBAL.read();
        self.resolve_transforms_with(&registry)
    }

    /// Apply every transform declaration using an explicit registry.
    pub fn resolve_transforms_with(
        &mut self,
        registry: &TransformRegistry,
    ) -> Result<&mut Self, ResolveError> {
        apply_node(self, registry)?;
        Ok(self)
    }
}

fn apply_node(cfg: &mut Config, registry: &TransformRegistry) -> Result<(), ResolveError> {
    if cfg.contains(TRANSFORM_KEY) {
        let declared = cfg.remove(TRANSFORM_KEY)?;
        let records = match declared {
            Value::Seq(records) => records,
            other => {
                return Err(ResolveError::InvalidTransformDeclaration {
                    found: other.to_string(),
                })
            }
        };
        for record in records.iter() {
            let record = match record {
                Value::Map(record) => record,
                other => {
                    return Err(ResolveError::InvalidTransformDeclaration {
                        found: other.to_string(),
                    })
                }
            };
            let name = record.get("name").and_then(Value::as_str).ok_or_else(|| {
                ResolveError::InvalidTransformDeclaration {
                    found: Value::Map(record.clone()).to_string(),
                }
            })?;
            let function = registry
                .get(name)
                .ok_or_else(|| ResolveError::UnknownTransform {
                    name: name.to_string(),
                })?;
            let mut kwargs = record.clone();
            kwargs.remove("name")?;
            debug!(transform = name, "applying transform");
            function(cfg, &kwargs)?;
        }
    }
    // Nested declarations run after the declaring mapping's own pipeline.
    for (_, value) in cfg.iter_mut() {
        apply_value(value, registry)?;
    }
    Ok(())
}

fn apply_value(value: &mut Value, registry: &TransformRegistry) -> Result<(), ResolveError> {
    match value {
        Value::Map(map) => apply_node(map, registry),
        Value::Seq(seq) => {
            for item in seq.items_mut() {
                apply_value(item, registry)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
