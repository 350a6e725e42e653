//! Intersection of resolved hierarchy ranges with externally supplied VM address ranges.

use std::{error, fmt};

use conversion::unit::{ParseError, parse_hex_address, parse_hex_bytes};
use memory::address::AddressRange;

/// A VM occupying `size` bytes of physical memory starting at `base`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VmDescriptor {
    /// The physical bytes occupied by the VM.
    range: AddressRange,
}

impl VmDescriptor {
    /// Creates a [`VmDescriptor`] occupying `[base, base + size - 1]`.
    ///
    /// # Errors
    ///
    /// - [`VmParseError::EmptySize`]: Returned if `size` is zero.
    /// - [`VmParseError::Wraps`]: Returned if the VM extends beyond the 64-bit address space.
    pub const fn new(base: u64, size: u64) -> Result<Self, VmParseError> {
        if size == 0 {
            return Err(VmParseError::EmptySize);
        }

        match AddressRange::from_base_size(base, size) {
            Some(range) => Ok(Self { range }),
            None => Err(VmParseError::Wraps),
        }
    }

    /// Parses a hexadecimal `base` address and a hexadecimal `size` in bytes.
    ///
    /// # Errors
    ///
    /// - [`VmParseError::Base`]: Returned if `base` is not a hexadecimal address.
    /// - [`VmParseError::Size`]: Returned if `size` is not a positive hexadecimal value.
    /// - [`VmParseError::Wraps`]: Returned if the VM extends beyond the 64-bit address space.
    pub fn parse(base: &str, size: &str) -> Result<Self, VmParseError> {
        let base = parse_hex_address(base).map_err(VmParseError::Base)?;
        let size = parse_hex_bytes(size).map_err(VmParseError::Size)?;
        Self::new(base, size)
    }

    /// Returns the base address of the VM.
    pub const fn base(&self) -> u64 {
        self.range.start()
    }

    /// Returns the physical bytes occupied by the VM.
    pub const fn range(&self) -> AddressRange {
        self.range
    }
}

/// Various errors that can occur while constructing a [`VmDescriptor`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum VmParseError {
    /// The base address failed to parse.
    Base(ParseError),
    /// The size failed to parse.
    Size(ParseError),
    /// The size was zero.
    EmptySize,
    /// The VM extends beyond the 64-bit address space.
    Wraps,
}

impl fmt::Display for VmParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(error) => write!(f, "invalid VM base address: {error}"),
            Self::Size(error) => write!(f, "invalid VM size: {error}"),
            Self::EmptySize => write!(f, "VM size must be greater than zero"),
            Self::Wraps => write!(f, "VM extends beyond the 64-bit address space"),
        }
    }
}

impl error::Error for VmParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Base(error) | Self::Size(error) => Some(error),
            Self::EmptySize | Self::Wraps => None,
        }
    }
}

/// The VMs that intersect the ranges of a hierarchy element.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Overlap {
    /// No VM intersects the element.
    None,
    /// Exactly one VM, identified by its index, intersects the element.
    Single(usize),
    /// Several VMs, identified by their indices, intersect the element.
    Conflict(Vec<usize>),
}

/// Determines which of `vms` intersect any of `ranges`.
pub fn classify(ranges: &[AddressRange], vms: &[VmDescriptor]) -> Overlap {
    let hits = vms
        .iter()
        .enumerate()
        .filter(|(_, vm)| ranges.iter().any(|range| range.overlaps(vm.range())))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    match hits.as_slice() {
        [] => Overlap::None,
        [index] => Overlap::Single(*index),
        _ => Overlap::Conflict(hits),
    }
}

#[cfg(test)]
mod test {
    use conversion::unit::ParseError;
    use memory::address::AddressRange;

    use super::{Overlap, VmDescriptor, VmParseError, classify};

    #[test]
    fn parse_vm_descriptors() {
        let vm = VmDescriptor::parse("0x1000", "0x2000").unwrap();
        assert_eq!(vm.base(), 0x1000);
        assert_eq!(vm.range(), AddressRange::new(0x1000, 0x2fff).unwrap());

        assert_eq!(VmDescriptor::parse("0", "1").unwrap().range().end(), 0);
        assert_eq!(
            VmDescriptor::parse("0xzz", "0x10"),
            Err(VmParseError::Base(ParseError::InvalidHexDigit('z')))
        );
        assert_eq!(
            VmDescriptor::parse("0x10", "0x0"),
            Err(VmParseError::Size(ParseError::NotPositive))
        );
        assert_eq!(
            VmDescriptor::parse("0xffffffffffffffff", "0x2"),
            Err(VmParseError::Wraps)
        );
        assert_eq!(VmDescriptor::new(0, 0), Err(VmParseError::EmptySize));
    }

    #[test]
    fn classify_overlaps() {
        let ranges = [
            AddressRange::new(0x000, 0x0ff).unwrap(),
            AddressRange::new(0x400, 0x4ff).unwrap(),
        ];
        let vms = [
            VmDescriptor::new(0x100, 0x100).unwrap(),
            VmDescriptor::new(0x4ff, 0x1).unwrap(),
            VmDescriptor::new(0x0, 0x1000).unwrap(),
        ];

        assert_eq!(classify(&ranges, &vms[..1]), Overlap::None);
        assert_eq!(classify(&ranges, &vms[..2]), Overlap::Single(1));
        assert_eq!(classify(&ranges, &vms), Overlap::Conflict(vec![1, 2]));
        assert_eq!(classify(&[], &vms), Overlap::None);
    }
}
