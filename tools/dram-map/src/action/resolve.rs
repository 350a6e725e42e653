//! Helper functions to resolve a drill-down path given a [`ResolveConfig`].

use std::io::Write;

use anyhow::{Context, Result};
use dram::{PathConstraint, ResolveLimits, resolve_ranges};

use crate::{
    action::write_ranges,
    cli::resolve::ResolveConfig,
    config::{self, Config},
};

/// Loads the configuration named by `config` and writes the physical address ranges selected by
/// the requested path to `out`.
///
/// # Errors
///
/// Returns errors if the configuration cannot be loaded, the path is out of order, the resolution
/// aborts or writing to `out` fails.
pub fn resolve_path<W: Write>(config: ResolveConfig, out: &mut W) -> Result<()> {
    let loaded = config::load(&config.config)?;
    let path = PathConstraint::from_entries(config.path)?;

    write_resolution(&loaded, &path, config.limits, out)
}

/// Writes the ranges selected by `path` under `config` to `out`.
fn write_resolution<W: Write>(
    config: &Config,
    path: &PathConstraint,
    limits: ResolveLimits,
    out: &mut W,
) -> Result<()> {
    let ranges = resolve_ranges(path, &config.mapping, config.space, limits)
        .with_context(|| format!("failed to resolve {path}"))?;

    writeln!(out, "{path}")?;
    write_ranges(out, &ranges, "  ")?;
    Ok(())
}
