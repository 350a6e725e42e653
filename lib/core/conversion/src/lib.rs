//! A const-friendly integer conversion library and parsers for human-entered sizes and addresses.
#![no_std]

pub mod unit;

/// Safely converts `value` to a `usize` relying on compile time code checking.
#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
pub const fn u32_to_usize(value: u32) -> usize {
    value as usize
}

/// Converts `value` to a `u64`, returning `None` if `value` cannot fit within a `u64`.
#[expect(clippy::cast_possible_truncation)]
pub const fn u128_to_u64_checked(value: u128) -> Option<u64> {
    if value > u64::MAX as u128 {
        return None;
    }

    Some(value as u64)
}
