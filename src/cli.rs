//! Command-line wiring.
//!
//! Translates `--config`, `--set`, and `--unset` tokens into calls against
//! the tree: fragment selections merge in order, then dotted-path overrides
//! apply to the still-mutable result. Override values use the same literal
//! syntax as the serialized text form.

use crate::config::Config;
use crate::error::ResolveError;
use crate::load;
use crate::value::Value;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "strata",
    about = "Compose reproducible run configurations from layered fragments"
)]
pub struct Cli {
    /// File holding the named configuration fragments
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Fragment names merged, in order, into the run configuration
    #[arg(long = "config", value_name = "NAME", num_args = 1.., action = clap::ArgAction::Append)]
    pub configs: Vec<String>,

    /// Dotted-path / value pairs assigned after the fragment merge
    #[arg(long = "set", value_names = ["PATH", "VALUE"], num_args = 2.., action = clap::ArgAction::Append)]
    pub sets: Vec<String>,

    /// Dotted paths removed after the fragment merge
    #[arg(long = "unset", value_name = "PATH", num_args = 1.., action = clap::ArgAction::Append)]
    pub unsets: Vec<String>,

    /// Finalize the result, attaching its identity, before printing
    #[arg(long)]
    pub finalize: bool,

    /// Base directory in which to initialize a run directory
    #[arg(long, value_name = "DIR")]
    pub run_dir: Option<PathBuf>,

    /// Description recorded for the run configuration
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,
}

/// Parse a value literal using the same syntax as the serialized text form:
/// scalars, flow sequences (`[a, b]`), and flow mappings (`{a: 1}`).
pub fn parse_value_literal(text: &str) -> Result<Value, ResolveError> {
    let raw: serde_yaml::Value = serde_yaml::from_str(text)?;
    load::from_yaml(raw)
}

/// Build the run configuration the parsed arguments describe. The fragment
/// file is loaded and fully resolved first; overrides apply to the mutable
/// merged tree, before any freezing.
pub fn build_config(cli: &Cli) -> Result<Config, ResolveError> {
    let mut fragments = Config::from_file(&cli.file)?;
    fragments.resolve_bases()?.resolve_transforms()?;

    let mut cfg = Config::new();
    for name in &cli.configs {
        debug!(fragment = name.as_str(), "selecting fragment");
        let selected = fragments
            .get_path(name)
            .ok_or_else(|| ResolveError::UnknownFragment { name: name.clone() })?
            .clone();
        match selected {
            Value::Map(fragment) => {
                cfg.rupdate(fragment)?;
            }
            other => {
                return Err(ResolveError::BaseNotMapping {
                    name: name.clone(),
                    kind: other.kind(),
                })
            }
        }
    }

    if cli.sets.len() % 2 != 0 {
        return Err(ResolveError::InvalidOverride {
            reason: "--set expects dotted-path / value pairs".to_string(),
        });
    }
    for pair in cli.sets.chunks(2) {
        let value = parse_value_literal(&pair[1])?;
        cfg.set_path(&pair[0], value)?;
    }
    for path in &cli.unsets {
        cfg.remove_path(path)?;
    }
    Ok(cfg)
}
