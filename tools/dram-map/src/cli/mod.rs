//! Command line parsing and [`Action`] construction.

use clap::{Arg, ArgAction, Command};

use crate::cli::{children::ChildrenConfig, decode::DecodeConfig, resolve::ResolveConfig};

pub mod children;
pub mod decode;
pub mod resolve;

/// The parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arguments {
    /// If `true`, debug logging is enabled unless `RUST_LOG` says otherwise.
    pub verbose: bool,
    /// The action to carry out.
    pub action: Action,
}

/// The action to carry out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Decode an address into the identifier of every level.
    Decode(DecodeConfig),
    /// Resolve a drill-down path into physical address ranges.
    Resolve(ResolveConfig),
    /// Resolve every child of a drill-down path.
    Children(ChildrenConfig),
}

/// Parses `dram-map`'s arguments to construct its [`Arguments`].
pub fn get_arguments() -> Arguments {
    let matches = command_parser().get_matches();
    let verbose = matches.get_flag("verbose");

    let Some((subcommand_name, subcommand_matches)) = matches.subcommand() else {
        unreachable!("subcommand is required");
    };
    let action = match subcommand_name {
        "decode" => Action::Decode(decode::parse_arguments(subcommand_matches)),
        "resolve" => Action::Resolve(resolve::parse_arguments(subcommand_matches)),
        "children" => Action::Children(children::parse_arguments(subcommand_matches)),
        _ => unreachable!("unexpected subcommand: {subcommand_name:?}"),
    };

    Arguments { verbose, action }
}

/// Returns the command parser for all [`Action`]s.
fn command_parser() -> Command {
    let verbose = Arg::new("verbose")
        .long("verbose")
        .short('v')
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Enables debug logging");

    Command::new("dram-map")
        .about("Decodes physical addresses and resolves memory hierarchy elements to address ranges")
        .arg(verbose)
        .subcommand(decode::subcommand_parser())
        .subcommand(resolve::subcommand_parser())
        .subcommand(children::subcommand_parser())
        .subcommand_required(true)
        .arg_required_else_help(true)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use dram::HierarchyLevel;

    use super::{children, command_parser, decode, resolve};

    #[test]
    fn command_parser_is_consistent() {
        command_parser().debug_assert();
    }

    #[test]
    fn parse_decode() {
        let matches = command_parser()
            .try_get_matches_from(["dram-map", "decode", "--config", "map.toml", "0x60"])
            .unwrap();
        let (_, matches) = matches.subcommand().unwrap();

        let config = decode::parse_arguments(matches);
        assert_eq!(config.config, PathBuf::from("map.toml"));
        assert_eq!(config.address, 0x60);
    }

    #[test]
    fn parse_resolve_path() {
        let matches = command_parser()
            .try_get_matches_from([
                "dram-map",
                "-v",
                "resolve",
                "-c",
                "map.toml",
                "--path",
                "channel=1",
                "--path",
                "bank=2",
                "--max-bit-span",
                "20",
            ])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        let (_, matches) = matches.subcommand().unwrap();

        let config = resolve::parse_arguments(matches);
        assert_eq!(
            config.path,
            [(HierarchyLevel::Channel, 1), (HierarchyLevel::Bank, 2)]
        );
        assert_eq!(config.limits.max_bit_span, 20);
        assert_eq!(config.limits.max_ranges, None);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(
            command_parser()
                .try_get_matches_from(["dram-map", "decode", "-c", "map.toml", "0xzz"])
                .is_err()
        );
        assert!(
            command_parser()
                .try_get_matches_from(["dram-map", "resolve", "-c", "map.toml", "-p", "bank"])
                .is_err()
        );
    }

    #[test]
    fn parse_children() {
        let matches = command_parser()
            .try_get_matches_from([
                "dram-map",
                "children",
                "-c",
                "map.toml",
                "--level",
                "bank-group",
                "--vm",
                "0x0:0x1000",
                "--vm",
                "0x2000:0x1000",
            ])
            .unwrap();
        let (_, matches) = matches.subcommand().unwrap();

        let config = children::parse_arguments(matches);
        assert_eq!(config.level, Some(HierarchyLevel::BankGroup));
        assert!(config.path.is_empty());
        assert_eq!(config.vms.len(), 2);
        assert_eq!(config.vms[1].base(), 0x2000);
    }
}
