//! Error types for the strata configuration model.

use thiserror::Error;

/// Errors raised by the tree container itself: construction, access, and
/// mutation of mapping and sequence nodes.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("key '{key}' collides with an accessor name of {container}")]
    ReservedKey { key: String, container: &'static str },

    #[error("this config was already finalized: setting key '{key}' to value {value} failed")]
    FrozenSet { key: String, value: String },

    #[error("this config was already finalized: removing key '{key}' failed")]
    FrozenRemove { key: String },

    #[error("this config was already finalized: mutable access to key '{key}' failed")]
    FrozenAccess { key: String },

    #[error("this sequence was already finalized: setting index {index} to value {value} failed")]
    FrozenSequenceSet { index: usize, value: String },

    #[error("this sequence was already finalized: {op} at index {index} failed")]
    FrozenSequenceEdit { op: &'static str, index: usize },

    #[error("config has no key '{key}'")]
    KeyNotFound { key: String },

    #[error("sequence index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("'{path}' holds a {kind}, not a mapping")]
    NotAMapping { path: String, kind: &'static str },

    #[error("'{path}' holds a {kind}, not a sequence")]
    NotASequence { path: String, kind: &'static str },
}

/// Errors raised while resolving a tree into its final form: loading,
/// inheritance expansion, and transform execution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("no fragment named '{name}' is declared")]
    UnknownFragment { name: String },

    #[error("base fragment '{name}' is not a mapping (found {kind})")]
    BaseNotMapping { name: String, kind: &'static str },

    #[error("base declaration must be a sequence of fragment names, found {found}")]
    InvalidBaseDeclaration { found: String },

    #[error("cyclic base reference involving fragment '{name}'")]
    CyclicBases { name: String },

    #[error("can not register '{name}' as transform, as the name is already in use")]
    DuplicateTransform { name: String },

    #[error("no transform named '{name}' is registered")]
    UnknownTransform { name: String },

    #[error("transform declaration must be a sequence of records with a 'name' field, found {found}")]
    InvalidTransformDeclaration { found: String },

    #[error("transform '{name}': {reason}")]
    BadTransformArgs { name: &'static str, reason: String },

    #[error("upper case of key '{key}' already exists")]
    KeyCaseConflict { key: String },

    #[error("environment variable named {name} was not defined")]
    MissingEnvVar { name: String },

    #[error(
        "the loaded config contains an identity '{declared}' which is not compatible \
         with the rest of the config '{computed}'"
    )]
    IdentityMismatch { declared: String, computed: String },

    #[error("the identity key must hold a string, found {found}")]
    InvalidIdentityValue { found: String },

    #[error("a loaded document must be a mapping at the top level, found {kind}")]
    DocumentNotMapping { kind: &'static str },

    #[error("mapping keys must be strings, found {found}")]
    NonStringKey { found: String },

    #[error("invalid override: {reason}")]
    InvalidOverride { reason: String },

    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
