//! Helper functions to decode a physical address given a [`DecodeConfig`].

use std::io::Write;

use anyhow::Result;
use dram::decode;
use tracing::warn;

use crate::{
    cli::decode::DecodeConfig,
    config::{self, Config},
};

/// Loads the configuration named by `config` and writes the identifier of every configured level
/// for the requested address to `out`.
///
/// # Errors
///
/// Returns errors if the configuration cannot be loaded or writing to `out` fails.
pub fn decode_address<W: Write>(config: DecodeConfig, out: &mut W) -> Result<()> {
    let loaded = config::load(&config.config)?;
    write_decoded(&loaded, config.address, out)
}

/// Writes the decoded identifiers of `address` under `config` to `out`.
///
/// Levels with no elements are omitted.
fn write_decoded<W: Write>(config: &Config, address: u64, out: &mut W) -> Result<()> {
    if !config.space.contains(address) {
        warn!(
            address,
            capacity = config.space.capacity(),
            "address lies beyond the configured capacity"
        );
    }

    let decoded = decode(address, &config.mapping);
    writeln!(out, "address {:#x}", decoded.address())?;
    for (level, outcome) in decoded.iter() {
        if config.mapping[level].count() == 0 {
            continue;
        }

        match outcome {
            Ok(id) => writeln!(out, "  {:<10} {id}", level.as_str())?,
            Err(diagnostic) => writeln!(out, "  {:<10} {diagnostic}", level.as_str())?,
        }
    }

    Ok(())
}
