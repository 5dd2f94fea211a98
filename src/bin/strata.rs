//! Strata CLI Binary
//!
//! Composes a run configuration from a fragment file plus command-line
//! overrides, optionally finalizes it, and prints the canonical text.

use anyhow::Context;
use clap::Parser;
use std::process;
use strata::cli::{self, Cli};
use strata::logging::init_logging;
use strata::paths;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(None) {
        eprintln!("failed to initialize logging: {e}");
        process::exit(1);
    }

    match run(&cli) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let mut cfg = cli::build_config(cli).context("building run configuration")?;

    if let Some(description) = &cli.description {
        cfg.set_description(description.clone());
    }
    if cli.finalize || cli.run_dir.is_some() {
        cfg.finalize();
        info!(id = cfg.identity().unwrap_or_default(), "finalized run configuration");
    }
    if let Some(base) = &cli.run_dir {
        let stamp = paths::timestamp(true, false);
        let dir = cfg
            .init_run_dir(base, Some(&stamp))
            .context("initializing run directory")?;
        info!(dir = %dir.display(), "run directory ready");
    }
    Ok(cfg.to_string())
}
