//! Loading of the TOML file that describes the address space and its bit mapping.
//!
//! ```toml
//! capacity = "1GB"
//!
//! [levels.bank]
//! count = 4
//! bits = ["5", "6"]
//! ```
//!
//! Each `bits` entry supplies one identifier bit, least significant first, and is either a
//! comma-separated string, a single position or a list of positions.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use conversion::unit::parse_capacity;
use dram::{AddressSpace, BitGroup, BitMapping, HierarchyLevel, LevelConfig};
use serde::Deserialize;
use tracing::warn;

/// The address space and bit mapping described by a configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The physical address space.
    pub space: AddressSpace,
    /// The bit mapping of every hierarchy level.
    pub mapping: BitMapping,
}

/// The configuration file as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// The capacity, such as `"2GB"`.
    capacity: String,
    /// The configured levels, keyed by level name.
    #[serde(default)]
    levels: BTreeMap<String, RawLevel>,
}

/// A single level as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLevel {
    /// The number of elements at the level.
    count: u64,
    /// The bit-groups, least significant identifier bit first.
    #[serde(default)]
    bits: Vec<RawGroup>,
}

/// A bit-group as written.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGroup {
    /// A single bit position.
    Position(u32),
    /// A list of bit positions.
    Positions(Vec<u32>),
    /// Comma-separated bit positions, parsed with [`BitGroup::parse`].
    Text(String),
}

/// Reads and parses the configuration file at `path`.
///
/// # Errors
///
/// Returns errors if the file cannot be read or does not describe a valid configuration.
pub fn load(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration \"{}\"", path.display()))?;

    parse(&text).with_context(|| format!("invalid configuration \"{}\"", path.display()))
}

/// Parses the textual contents of a configuration file.
///
/// Unparsable bit-groups are kept so that they can be reported per level.
///
/// # Errors
///
/// Returns errors if `text` is not valid TOML, the capacity is invalid, a level is unknown or
/// configured twice, or a level has more bit-groups than identifier bits.
pub fn parse(text: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(text)?;

    let capacity = parse_capacity(&raw.capacity)
        .with_context(|| format!("invalid capacity {:?}", raw.capacity))?;
    let space = AddressSpace::new(capacity)
        .ok_or_else(|| anyhow!("capacity {:?} is empty", raw.capacity))?;

    let mut mapping = BitMapping::new();
    let mut configured = [false; HierarchyLevel::COUNT];
    for (name, raw_level) in raw.levels {
        let level = name.parse::<HierarchyLevel>()?;
        if configured[level.index()] {
            bail!("level {level} is configured more than once");
        }
        configured[level.index()] = true;

        let mut config = LevelConfig::new(raw_level.count);
        for (index, group) in raw_level.bits.into_iter().enumerate() {
            let result = match group {
                RawGroup::Position(position) => config.set_group(index, BitGroup::single(position)),
                RawGroup::Positions(positions) => config.set_group(index, BitGroup::new(positions)),
                RawGroup::Text(text) => config.set_group_text(index, &text),
            };
            result.with_context(|| format!("level {level} has {} elements", raw_level.count))?;
        }

        for (bit, group) in config.groups().iter().enumerate() {
            if let Err(error) = group {
                warn!(%level, bit, %error, "unparsable bit-group");
            }
        }

        mapping[level] = config;
    }

    Ok(Config { space, mapping })
}
