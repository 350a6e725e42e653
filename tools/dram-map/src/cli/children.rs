//! Command line parsing and [`Action::Children`][ac] construction.
//!
//! [ac]: crate::cli::Action::Children

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use dram::{HierarchyLevel, ResolveLimits, VmDescriptor};

use crate::common::{
    config_arg, get_config, get_limits, get_path, limit_args, parse_vm, path_arg,
};

/// Description of a single drill-down view.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ChildrenConfig {
    /// The configuration file describing the bit mapping.
    pub config: PathBuf,
    /// The selected drill-down path, in the order it was provided.
    pub path: Vec<(HierarchyLevel, u64)>,
    /// The level whose elements are listed, defaulting to the level after the path.
    pub level: Option<HierarchyLevel>,
    /// The VMs checked against every element.
    pub vms: Vec<VmDescriptor>,
    /// The bounds on each resolution.
    pub limits: ResolveLimits,
}

/// Parses the arguments required to produce a valid [`ChildrenConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> ChildrenConfig {
    let vms = matches
        .get_many::<VmDescriptor>("vm")
        .map(|vms| vms.copied().collect())
        .unwrap_or_default();

    ChildrenConfig {
        config: get_config(matches),
        path: get_path(matches),
        level: matches.get_one::<HierarchyLevel>("level").copied(),
        vms,
        limits: get_limits(matches),
    }
}

/// Returns the command parser for an [`Action::Children`][ac].
///
/// [ac]: crate::cli::Action::Children
pub fn subcommand_parser() -> Command {
    let level = Arg::new("level")
        .long("level")
        .short('l')
        .value_parser(value_parser!(HierarchyLevel))
        .help("Level to list instead of the one following the path");

    let vm = Arg::new("vm")
        .long("vm")
        .value_name("BASE:SIZE")
        .value_parser(parse_vm)
        .action(ArgAction::Append)
        .help("VM occupying SIZE bytes from BASE, both hexadecimal");

    Command::new("children")
        .about("Resolves every element of the next level beneath a drill-down path")
        .arg(config_arg())
        .arg(path_arg())
        .arg(level)
        .arg(vm)
        .args(limit_args())
}
