//! Decodes physical addresses into memory hierarchy identifiers and resolves hierarchy elements
//! back into the physical address ranges that decode to them.

use std::io;

use anyhow::Result;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    action::{children::list_children, decode::decode_address, resolve::resolve_path},
    cli::Action,
};

pub mod action;
pub mod cli;
pub mod common;
pub mod config;

fn main() -> Result<()> {
    let arguments = cli::get_arguments();

    let default_directive = if arguments.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::Registry::default()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()?;

    let mut out = io::stdout().lock();
    match arguments.action {
        Action::Decode(config) => decode_address(config, &mut out)?,
        Action::Resolve(config) => resolve_path(config, &mut out)?,
        Action::Children(config) => list_children(config, &mut out)?,
    }

    Ok(())
}
