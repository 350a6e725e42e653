//! Parsers for human-entered capacities and hexadecimal byte values.

use core::{error, fmt};

use crate::{u32_to_usize, u128_to_u64_checked};

/// The number of bytes in a kibibyte.
pub const KIB: u64 = 1024;
/// The number of bytes in a mebibyte.
pub const MIB: u64 = KIB * 1024;
/// The number of bytes in a gibibyte.
pub const GIB: u64 = MIB * 1024;
/// The number of bytes in a tebibyte.
pub const TIB: u64 = GIB * 1024;

/// Fractional digits beyond this count are ignored.
const MAX_FRACTION_DIGITS: u32 = 24;

/// Parses a capacity such as `"2GB"`, `"1.5 K"` or `"4096"` into a number of bytes.
///
/// The accepted grammar is a non-negative decimal number, optionally followed by a
/// case-insensitive binary prefix (`K`, `M`, `G` or `T`) and an optional trailing `B`. Surrounding
/// whitespace and whitespace between the number and the unit are ignored. Fractional results are
/// rounded down to whole bytes.
///
/// # Errors
///
/// - [`ParseError::Empty`]: Returned if `input` contains nothing but whitespace.
/// - [`ParseError::InvalidNumber`]: Returned if the numeric part is malformed.
/// - [`ParseError::UnexpectedCharacter`]: Returned if the unit is not recognized.
/// - [`ParseError::NotPositive`]: Returned if the capacity is zero bytes.
/// - [`ParseError::OutOfRange`]: Returned if the capacity does not fit within a `u64`.
pub fn parse_capacity(input: &str) -> Result<u64, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    let number_len = input
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(number_len);

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (number, None),
    };
    if whole.is_empty() {
        return Err(ParseError::InvalidNumber);
    }
    if let Some(fraction) = fraction
        && (fraction.is_empty() || fraction.contains('.'))
    {
        return Err(ParseError::InvalidNumber);
    }

    let multiplier = u128::from(parse_unit(unit.trim_start())?);
    let mut bytes = parse_decimal(whole)?
        .checked_mul(multiplier)
        .ok_or(ParseError::OutOfRange)?;

    if let Some(fraction) = fraction {
        let mut numerator = 0u128;
        let mut denominator = 1u128;
        for digit in fraction.bytes().take(u32_to_usize(MAX_FRACTION_DIGITS)) {
            numerator = numerator * 10 + u128::from(digit - b'0');
            denominator *= 10;
        }

        bytes = bytes
            .checked_add(numerator * multiplier / denominator)
            .ok_or(ParseError::OutOfRange)?;
    }

    let bytes = u128_to_u64_checked(bytes).ok_or(ParseError::OutOfRange)?;
    if bytes == 0 {
        return Err(ParseError::NotPositive);
    }

    Ok(bytes)
}

/// Parses a hexadecimal byte count such as `"0x1000"` or `"ff"`.
///
/// # Errors
///
/// Returns the same errors as [`parse_hex_address`], and [`ParseError::NotPositive`] if the value
/// is zero.
pub fn parse_hex_bytes(input: &str) -> Result<u64, ParseError> {
    let value = parse_hex_address(input)?;
    if value == 0 {
        return Err(ParseError::NotPositive);
    }

    Ok(value)
}

/// Parses a hexadecimal address with an optional `0x` or `0X` prefix.
///
/// # Errors
///
/// - [`ParseError::Empty`]: Returned if no digits are present.
/// - [`ParseError::InvalidHexDigit`]: Returned if a character is not a hexadecimal digit.
/// - [`ParseError::OutOfRange`]: Returned if the value does not fit within a `u64`.
pub fn parse_hex_address(input: &str) -> Result<u64, ParseError> {
    let input = input.trim();
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut value = 0u64;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(16) else {
            return Err(ParseError::InvalidHexDigit(c));
        };

        value = value
            .checked_mul(16)
            .and_then(|value| value.checked_add(u64::from(digit)))
            .ok_or(ParseError::OutOfRange)?;
    }

    Ok(value)
}

/// Returns the multiplier described by `unit`.
fn parse_unit(unit: &str) -> Result<u64, ParseError> {
    let mut chars = unit.chars();
    let multiplier = match chars.clone().next() {
        Some('k' | 'K') => KIB,
        Some('m' | 'M') => MIB,
        Some('g' | 'G') => GIB,
        Some('t' | 'T') => TIB,
        _ => 1,
    };
    if multiplier != 1 {
        chars.next();
    }

    match chars.next() {
        None | Some('b' | 'B') => {}
        Some(c) => return Err(ParseError::UnexpectedCharacter(c)),
    }
    match chars.next() {
        None => Ok(multiplier),
        Some(c) => Err(ParseError::UnexpectedCharacter(c)),
    }
}

/// Parses a non-empty string of ASCII digits.
fn parse_decimal(digits: &str) -> Result<u128, ParseError> {
    digits.bytes().try_fold(0u128, |value, digit| {
        value
            .checked_mul(10)
            .and_then(|value| value.checked_add(u128::from(digit - b'0')))
            .ok_or(ParseError::OutOfRange)
    })
}

/// Various errors that can occur while parsing a capacity or hexadecimal value.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ParseError {
    /// The input contained no value.
    Empty,
    /// The numeric part of a capacity was malformed.
    InvalidNumber,
    /// An unknown unit or trailing character was encountered.
    UnexpectedCharacter(char),
    /// A character was not a hexadecimal digit.
    InvalidHexDigit(char),
    /// The value was zero where a positive value is required.
    NotPositive,
    /// The value does not fit within a `u64`.
    OutOfRange,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no value was provided"),
            Self::InvalidNumber => write!(f, "malformed number"),
            Self::UnexpectedCharacter(c) => write!(f, "unexpected unit character {c:?}"),
            Self::InvalidHexDigit(c) => write!(f, "invalid hexadecimal digit {c:?}"),
            Self::NotPositive => write!(f, "value must be greater than zero"),
            Self::OutOfRange => write!(f, "value does not fit in 64 bits"),
        }
    }
}

impl error::Error for ParseError {}

#[cfg(test)]
mod test {
    use super::{GIB, KIB, MIB, ParseError, parse_capacity, parse_hex_address, parse_hex_bytes};

    #[test]
    fn capacity_with_prefixes() {
        assert_eq!(parse_capacity("1GB"), Ok(1_073_741_824));
        assert_eq!(parse_capacity("2GB"), Ok(2_147_483_648));
        assert_eq!(parse_capacity("4k"), Ok(4 * KIB));
        assert_eq!(parse_capacity("16 MB"), Ok(16 * MIB));
        assert_eq!(parse_capacity("  512b  "), Ok(512));
        assert_eq!(parse_capacity("4096"), Ok(4096));
        assert_eq!(parse_capacity("1T"), Ok(1024 * GIB));
    }

    #[test]
    fn capacity_fractions_round_down() {
        assert_eq!(parse_capacity("1.5K"), Ok(1536));
        assert_eq!(parse_capacity("0.5GB"), Ok(GIB / 2));
        assert_eq!(parse_capacity("1.0001K"), Ok(1024));
        assert_eq!(parse_capacity("0.1B"), Err(ParseError::NotPositive));
    }

    #[test]
    fn capacity_rejects_malformed_input() {
        assert_eq!(parse_capacity("abc"), Err(ParseError::InvalidNumber));
        assert_eq!(parse_capacity(""), Err(ParseError::Empty));
        assert_eq!(parse_capacity("GB"), Err(ParseError::InvalidNumber));
        assert_eq!(parse_capacity("1.2.3G"), Err(ParseError::InvalidNumber));
        assert_eq!(parse_capacity("1."), Err(ParseError::InvalidNumber));
        assert_eq!(parse_capacity("-1G"), Err(ParseError::InvalidNumber));
        assert_eq!(parse_capacity("1X"), Err(ParseError::UnexpectedCharacter('X')));
        assert_eq!(parse_capacity("1GiB"), Err(ParseError::UnexpectedCharacter('i')));
        assert_eq!(parse_capacity("1GBB"), Err(ParseError::UnexpectedCharacter('B')));
    }

    #[test]
    fn capacity_rejects_zero_and_overflow() {
        assert_eq!(parse_capacity("0GB"), Err(ParseError::NotPositive));
        assert_eq!(parse_capacity("0"), Err(ParseError::NotPositive));
        assert_eq!(parse_capacity("99999999999T"), Err(ParseError::OutOfRange));
    }

    #[test]
    fn hex_values() {
        assert_eq!(parse_hex_bytes("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_bytes("0XfF"), Ok(0xff));
        assert_eq!(parse_hex_bytes("40000000"), Ok(0x4000_0000));
        assert_eq!(parse_hex_bytes("0x0"), Err(ParseError::NotPositive));
        assert_eq!(parse_hex_bytes("0x"), Err(ParseError::Empty));
        assert_eq!(parse_hex_bytes("0xg1"), Err(ParseError::InvalidHexDigit('g')));
        assert_eq!(
            parse_hex_bytes("0x1_0000_0000_0000_0000"),
            Err(ParseError::InvalidHexDigit('_'))
        );
        assert_eq!(
            parse_hex_bytes("10000000000000000"),
            Err(ParseError::OutOfRange)
        );

        assert_eq!(parse_hex_address("0x0"), Ok(0));
        assert_eq!(parse_hex_address("0x60"), Ok(0x60));
        assert_eq!(parse_hex_address("ffffffffffffffff"), Ok(u64::MAX));
    }
}
