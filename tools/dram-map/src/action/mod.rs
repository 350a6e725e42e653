//! Implementations of the [`Action`][action]s.
//!
//! [action]: crate::cli::Action

use std::io::{self, Write};

use dram::AddressRange;

pub mod children;
pub mod decode;
pub mod resolve;

/// Writes `ranges` one per line, each preceded by `indent`, followed by their total size.
///
/// # Errors
///
/// Returns errors if writing to `out` fails.
fn write_ranges<W: Write>(out: &mut W, ranges: &[AddressRange], indent: &str) -> io::Result<()> {
    if ranges.is_empty() {
        return writeln!(out, "{indent}no matching addresses");
    }

    let mut total = 0u128;
    for range in ranges {
        writeln!(out, "{indent}{range}")?;
        total += u128::from(range.end() - range.start()) + 1;
    }

    writeln!(out, "{indent}{} range(s), {total:#x} bytes", ranges.len())
}
