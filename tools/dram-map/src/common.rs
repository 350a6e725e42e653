//! Various items that are common between [`Action`][a] parsing and execution.
//!
//! [a]: crate::cli::Action

use std::{error, fmt, num::ParseIntError, path::PathBuf};

use clap::{Arg, ArgAction, ArgMatches, value_parser};
use conversion::unit::{ParseError, parse_hex_address};
use dram::{HierarchyLevel, ResolveLimits, UnknownLevelError, VmDescriptor, VmParseError};

/// Returns the argument naming the configuration file.
pub fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .env("DRAM_MAP_CONFIG")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("TOML file describing the capacity and bit mapping")
}

/// Returns the configuration file path parsed by [`config_arg`].
pub fn get_config(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| unreachable!("`config` is a required argument"))
}

/// Returns the repeatable argument selecting a drill-down path.
pub fn path_arg() -> Arg {
    Arg::new("path")
        .long("path")
        .short('p')
        .value_name("LEVEL=ID")
        .value_parser(parse_path_entry)
        .action(ArgAction::Append)
        .help("Selects identifier ID at LEVEL; repeat in hierarchy order")
}

/// Returns the path entries parsed by [`path_arg`], in the order they were provided.
pub fn get_path(matches: &ArgMatches) -> Vec<(HierarchyLevel, u64)> {
    matches
        .get_many::<(HierarchyLevel, u64)>("path")
        .map(|entries| entries.copied().collect())
        .unwrap_or_default()
}

/// Returns the arguments overriding the [`ResolveLimits`].
pub fn limit_args() -> [Arg; 2] {
    let max_bit_span = Arg::new("max-bit-span")
        .long("max-bit-span")
        .value_parser(value_parser!(u32))
        .help("Largest distance between the lowest and highest constrained bit");

    let max_ranges = Arg::new("max-ranges")
        .long("max-ranges")
        .value_parser(value_parser!(usize))
        .help("Largest number of ranges a single resolution may produce (unlimited by default)");

    [max_bit_span, max_ranges]
}

/// Returns the [`ResolveLimits`] described by [`limit_args`].
pub fn get_limits(matches: &ArgMatches) -> ResolveLimits {
    let defaults = ResolveLimits::default();

    ResolveLimits {
        max_bit_span: matches
            .get_one::<u32>("max-bit-span")
            .copied()
            .unwrap_or(defaults.max_bit_span),
        max_ranges: matches
            .get_one::<usize>("max-ranges")
            .copied()
            .or(defaults.max_ranges),
    }
}

/// Parses a path entry of the form `LEVEL=ID`, where `ID` is decimal or `0x`-prefixed
/// hexadecimal.
///
/// # Errors
///
/// Returns an [`ArgumentError`] if the entry is malformed.
pub fn parse_path_entry(entry: &str) -> Result<(HierarchyLevel, u64), ArgumentError> {
    let (level, id) = entry
        .split_once('=')
        .ok_or(ArgumentError::MissingSeparator('='))?;

    let level = level.parse::<HierarchyLevel>()?;
    let id = id.trim();
    let id = if id.starts_with("0x") || id.starts_with("0X") {
        parse_hex_address(id)?
    } else {
        id.parse::<u64>()?
    };

    Ok((level, id))
}

/// Parses a VM descriptor of the form `BASE:SIZE`, both in hexadecimal.
///
/// # Errors
///
/// Returns an [`ArgumentError`] if the descriptor is malformed.
pub fn parse_vm(descriptor: &str) -> Result<VmDescriptor, ArgumentError> {
    let (base, size) = descriptor
        .split_once(':')
        .ok_or(ArgumentError::MissingSeparator(':'))?;

    Ok(VmDescriptor::parse(base, size)?)
}

/// Various errors that can occur while parsing command line values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    /// The value did not contain the expected separator.
    MissingSeparator(char),
    /// The hierarchy level was not recognized.
    Level(UnknownLevelError),
    /// The decimal identifier failed to parse.
    Decimal(ParseIntError),
    /// The hexadecimal identifier failed to parse.
    Hex(ParseError),
    /// The VM descriptor was invalid.
    Vm(VmParseError),
}

impl From<UnknownLevelError> for ArgumentError {
    fn from(value: UnknownLevelError) -> Self {
        Self::Level(value)
    }
}

impl From<ParseIntError> for ArgumentError {
    fn from(value: ParseIntError) -> Self {
        Self::Decimal(value)
    }
}

impl From<ParseError> for ArgumentError {
    fn from(value: ParseError) -> Self {
        Self::Hex(value)
    }
}

impl From<VmParseError> for ArgumentError {
    fn from(value: VmParseError) -> Self {
        Self::Vm(value)
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator(separator) => write!(f, "expected a {separator:?} separator"),
            Self::Level(error) => write!(f, "{error}"),
            Self::Decimal(error) => write!(f, "invalid identifier: {error}"),
            Self::Hex(error) => write!(f, "invalid identifier: {error}"),
            Self::Vm(error) => write!(f, "{error}"),
        }
    }
}

impl error::Error for ArgumentError {}

#[cfg(test)]
mod test {
    use dram::{HierarchyLevel, VmDescriptor};

    use super::{ArgumentError, parse_path_entry, parse_vm};

    #[test]
    fn path_entries() {
        assert_eq!(parse_path_entry("channel=1"), Ok((HierarchyLevel::Channel, 1)));
        assert_eq!(parse_path_entry("BankGroup=0x3"), Ok((HierarchyLevel::BankGroup, 3)));
        assert_eq!(parse_path_entry("row= 42"), Ok((HierarchyLevel::Row, 42)));

        assert_eq!(
            parse_path_entry("channel"),
            Err(ArgumentError::MissingSeparator('='))
        );
        assert!(matches!(
            parse_path_entry("dimm=0"),
            Err(ArgumentError::Level(_))
        ));
        assert!(matches!(
            parse_path_entry("rank=-1"),
            Err(ArgumentError::Decimal(_))
        ));
        assert!(matches!(
            parse_path_entry("rank=0xq"),
            Err(ArgumentError::Hex(_))
        ));
    }

    #[test]
    fn vm_descriptors() {
        assert_eq!(
            parse_vm("0x40000000:0x10000000"),
            Ok(VmDescriptor::new(0x4000_0000, 0x1000_0000).unwrap())
        );
        assert_eq!(parse_vm("0x1000"), Err(ArgumentError::MissingSeparator(':')));
        assert!(matches!(parse_vm("0x1000:0"), Err(ArgumentError::Vm(_))));
    }
}
