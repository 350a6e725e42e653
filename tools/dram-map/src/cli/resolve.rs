//! Command line parsing and [`Action::Resolve`][ar] construction.
//!
//! [ar]: crate::cli::Action::Resolve

use std::path::PathBuf;

use clap::{ArgMatches, Command};
use dram::{HierarchyLevel, ResolveLimits};

use crate::common::{config_arg, get_config, get_limits, get_path, limit_args, path_arg};

/// Description of a range resolution.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ResolveConfig {
    /// The configuration file describing the bit mapping.
    pub config: PathBuf,
    /// The selected drill-down path, in the order it was provided.
    pub path: Vec<(HierarchyLevel, u64)>,
    /// The bounds on the resolution.
    pub limits: ResolveLimits,
}

/// Parses the arguments required to produce a valid [`ResolveConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> ResolveConfig {
    ResolveConfig {
        config: get_config(matches),
        path: get_path(matches),
        limits: get_limits(matches),
    }
}

/// Returns the command parser for an [`Action::Resolve`][ar].
///
/// [ar]: crate::cli::Action::Resolve
pub fn subcommand_parser() -> Command {
    Command::new("resolve")
        .about("Resolves a drill-down path into the physical address ranges that decode to it")
        .arg(config_arg())
        .arg(path_arg())
        .args(limit_args())
}
