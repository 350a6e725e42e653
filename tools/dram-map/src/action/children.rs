//! Helper functions to display one drill-down view given a [`ChildrenConfig`].

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use dram::{
    HierarchyLevel, Overlap, PathConstraint, ResolveLimits, VmDescriptor, classify,
    resolve_children,
};
use tracing::debug;

use crate::{
    action::write_ranges,
    cli::children::ChildrenConfig,
    config::{self, Config},
};

/// Loads the configuration named by `config` and writes the ranges of every element of the
/// displayed level, together with the VMs that intersect it, to `out`.
///
/// # Errors
///
/// Returns errors if the configuration cannot be loaded, the path or level is out of order, or
/// writing to `out` fails.
pub fn list_children<W: Write>(config: ChildrenConfig, out: &mut W) -> Result<()> {
    let loaded = config::load(&config.config)?;
    let path = PathConstraint::from_entries(config.path)?;
    let level = match config.level {
        Some(level) => level,
        None => path
            .child_level()
            .ok_or_else(|| anyhow!("{path} already selects the innermost level"))?,
    };

    write_children(&loaded, &path, level, &config.vms, config.limits, out)
}

/// Writes every child of `path` at `level` under `config` to `out`.
///
/// A child whose resolution aborts is reported in place without ending the listing.
fn write_children<W: Write>(
    config: &Config,
    path: &PathConstraint,
    level: HierarchyLevel,
    vms: &[VmDescriptor],
    limits: ResolveLimits,
    out: &mut W,
) -> Result<()> {
    let children = resolve_children(path, level, &config.mapping, config.space, limits)
        .with_context(|| format!("cannot list {level} beneath {path}"))?;

    writeln!(out, "{path}")?;
    for (id, result) in children {
        writeln!(out, "{level}={id}")?;

        let ranges = match result {
            Ok(ranges) => ranges,
            Err(error) => {
                debug!(%level, id, %error, "child resolution aborted");
                writeln!(out, "  error: {error}")?;
                continue;
            }
        };
        write_ranges(out, &ranges, "  ")?;

        if vms.is_empty() {
            continue;
        }
        match classify(&ranges, vms) {
            Overlap::None => writeln!(out, "  vm: none")?,
            Overlap::Single(index) => writeln!(out, "  vm: {index}")?,
            Overlap::Conflict(indices) => writeln!(out, "  vm: conflict {indices:?}")?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use dram::{HierarchyLevel, PathConstraint, ResolveLimits, VmDescriptor};

    use super::write_children;
    use crate::config::{Config, parse};

    fn config() -> Config {
        parse(
            r#"
            capacity = "256B"

            [levels.channel]
            count = 2
            bits = ["7"]

            [levels.bank]
            count = 4
            bits = ["5", "6"]

            [levels.row]
            count = 2
            bits = ["12"]
            "#,
        )
        .unwrap()
    }

    fn render(path: &PathConstraint, level: HierarchyLevel, vms: &[VmDescriptor]) -> String {
        let mut out = Vec::new();
        write_children(&config(), path, level, vms, ResolveLimits::default(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn list_channels_with_vms() {
        let vms = [
            VmDescriptor::new(0x00, 0x40).unwrap(),
            VmDescriptor::new(0x70, 0x20).unwrap(),
        ];

        assert_eq!(
            render(&PathConstraint::new(), HierarchyLevel::Channel, &vms),
            "(root)\n\
             channel=0\n  [0x0, 0x7f]\n  1 range(s), 0x80 bytes\n  vm: conflict [0, 1]\n\
             channel=1\n  [0x80, 0xff]\n  1 range(s), 0x80 bytes\n  vm: 1\n"
        );
    }

    #[test]
    fn list_banks_beneath_channel() {
        let path = PathConstraint::from_entries([(HierarchyLevel::Channel, 1)]).unwrap();
        let output = render(&path, HierarchyLevel::Bank, &[]);

        assert!(output.starts_with("channel=1\nbank=0\n  [0x80, 0x9f]\n"));
        assert!(output.contains("bank=3\n  [0xe0, 0xff]\n"));
        assert!(!output.contains("vm:"));
    }

    #[test]
    fn aborted_children_are_reported_in_place() {
        let output = render(&PathConstraint::new(), HierarchyLevel::Row, &[]);

        assert_eq!(output.matches("error: ").count(), 2);
        assert!(output.contains("row=1\n  error: "));
    }

    #[test]
    fn out_of_order_level_is_rejected() {
        let path = PathConstraint::from_entries([(HierarchyLevel::Bank, 0)]).unwrap();

        let mut out = Vec::new();
        assert!(
            write_children(
                &config(),
                &path,
                HierarchyLevel::Channel,
                &[],
                ResolveLimits::default(),
                &mut out,
            )
            .is_err()
        );
    }
}
