//! Fragment inheritance.
//!
//! A fragment is a named mapping that may declare base fragments under
//! [`BASE_KEY`]. Resolution builds each fragment's effective value by
//! merging the already-resolved bases in declared order and overlaying the
//! fragment's own content on top. Base names are dotted paths looked up
//! against the root fragment mapping, so nested fragments can build on
//! top-level ones.

use crate::config::{Config, BASE_KEY};
use crate::error::ResolveError;
use crate::value::{Sequence, Value};
use std::collections::HashMap;
use tracing::debug;

impl Config {
    /// Expand every base declaration in the tree, in place. Returns the
    /// receiver for chaining.
    pub fn resolve_bases(&mut self) -> Result<&mut Self, ResolveError> {
        let mut resolver = Resolver {
            root: self.clone(),
            cache: HashMap::new(),
            stack: Vec::new(),
        };
        let source = resolver.root.clone();
        let resolved = resolver.resolve_map(source)?;
        let description = self.description().map(str::to_owned);
        *self = resolved;
        if let Some(description) = description {
            self.set_description(description);
        }
        Ok(self)
    }
}

struct Resolver {
    root: Config,
    /// Fully resolved fragments by dotted path.
    cache: HashMap<String, Value>,
    /// Paths currently being resolved, for cycle detection.
    stack: Vec<String>,
}

impl Resolver {
    fn resolve_fragment(&mut self, path: &str) -> Result<Value, ResolveError> {
        if let Some(resolved) = self.cache.get(path) {
            return Ok(resolved.clone());
        }
        if self.stack.iter().any(|active| active == path) {
            return Err(ResolveError::CyclicBases {
                name: path.to_string(),
            });
        }
        let raw = self
            .root
            .get_path(path)
            .ok_or_else(|| ResolveError::UnknownFragment {
                name: path.to_string(),
            })?
            .clone();

        self.stack.push(path.to_string());
        let resolved = self.resolve_value(raw)?;
        self.stack.pop();

        debug!(fragment = path, "resolved base fragment");
        self.cache.insert(path.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn resolve_value(&mut self, value: Value) -> Result<Value, ResolveError> {
        match value {
            Value::Map(map) => Ok(Value::Map(self.resolve_map(map)?)),
            Value::Seq(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for item in seq.iter() {
                    items.push(self.resolve_value(item.clone())?);
                }
                Ok(Value::Seq(Sequence::from_values(items)))
            }
            scalar => Ok(scalar),
        }
    }

    fn resolve_map(&mut self, mut map: Config) -> Result<Config, ResolveError> {
        let bases = if map.contains(BASE_KEY) {
            base_names(map.remove(BASE_KEY)?)?
        } else {
            Vec::new()
        };

        let mut effective = Config::new();
        for name in &bases {
            match self.resolve_fragment(name)? {
                Value::Map(base) => {
                    effective.rupdate(base)?;
                }
                other => {
                    return Err(ResolveError::BaseNotMapping {
                        name: name.clone(),
                        kind: other.kind(),
                    })
                }
            }
        }

        // Own content wins over every base, later bases over earlier ones.
        let mut own = Config::new();
        for (key, value) in map.entries_mut().drain(..) {
            own.set(key, self.resolve_value(value)?)?;
        }
        effective.rupdate(own)?;
        Ok(effective)
    }
}

fn base_names(declared: Value) -> Result<Vec<String>, ResolveError> {
    let seq = match declared {
        Value::Seq(seq) => seq,
        other => {
            return Err(ResolveError::InvalidBaseDeclaration {
                found: other.to_string(),
            })
        }
    };
    seq.iter()
        .map(|item| match item {
            Value::Str(name) => Ok(name.clone()),
            other => Err(ResolveError::InvalidBaseDeclaration {
                found: other.to_string(),
            }),
        })
        .collect()
}
