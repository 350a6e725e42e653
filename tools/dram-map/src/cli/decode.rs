//! Command line parsing and [`Action::Decode`][ad] construction.
//!
//! [ad]: crate::cli::Action::Decode

use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};
use conversion::unit::parse_hex_address;

use crate::common::{config_arg, get_config};

/// Description of an address decode.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct DecodeConfig {
    /// The configuration file describing the bit mapping.
    pub config: PathBuf,
    /// The physical address to decode.
    pub address: u64,
}

/// Parses the arguments required to produce a valid [`DecodeConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> DecodeConfig {
    let address = matches
        .get_one::<u64>("address")
        .copied()
        .unwrap_or_else(|| unreachable!("`address` is a required argument"));

    DecodeConfig {
        config: get_config(matches),
        address,
    }
}

/// Returns the command parser for an [`Action::Decode`][ad].
///
/// [ad]: crate::cli::Action::Decode
pub fn subcommand_parser() -> Command {
    let address = Arg::new("address")
        .value_name("ADDRESS")
        .value_parser(parse_hex_address)
        .required(true)
        .help("Hexadecimal physical address, with or without a 0x prefix");

    Command::new("decode")
        .about("Decodes a physical address into the identifier of every level")
        .arg(config_arg())
        .arg(address)
}
