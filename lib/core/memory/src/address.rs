//! Shared abstractions for linear physical address spaces.

use core::{fmt, num::NonZeroU64};

/// A description of a linear physical address space of a fixed capacity.
///
/// The valid addresses are `[0, capacity)`. The capacity need not be a power of two.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct AddressSpace {
    /// The number of bytes in the address space.
    capacity: NonZeroU64,
}

impl AddressSpace {
    /// Constructs a new [`AddressSpace`] containing `capacity` bytes.
    ///
    /// Returns `None` if `capacity` is zero.
    pub const fn new(capacity: u64) -> Option<Self> {
        let Some(capacity) = NonZeroU64::new(capacity) else {
            return None;
        };

        Some(Self { capacity })
    }

    /// Returns the number of bytes in the [`AddressSpace`].
    pub const fn capacity(self) -> u64 {
        self.capacity.get()
    }

    /// Returns the highest valid address in the [`AddressSpace`].
    pub const fn last_address(self) -> u64 {
        self.capacity.get() - 1
    }

    /// Returns the [`AddressRange`] that covers the entire [`AddressSpace`].
    pub const fn whole_range(self) -> AddressRange {
        AddressRange {
            start: 0,
            end: self.last_address(),
        }
    }

    /// Returns `true` if `address` lies within the [`AddressSpace`].
    pub const fn contains(self, address: u64) -> bool {
        address < self.capacity.get()
    }

    /// Returns `⌊log2(capacity)⌋`, the highest bit position that a constraint may reference.
    pub const fn highest_varying_bit(self) -> u32 {
        self.capacity.ilog2()
    }
}

/// A closed interval `[start, end]` of physical byte addresses.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddressRange {
    /// The inclusive start of the range.
    start: u64,
    /// The inclusive end of the range.
    end: u64,
}

impl AddressRange {
    /// Creates a new address range with an inclusive `start` and an inclusive `end`.
    ///
    /// Returns `None` if `start > end`.
    pub const fn new(start: u64, end: u64) -> Option<Self> {
        if start > end {
            return None;
        }

        Some(Self { start, end })
    }

    /// Creates a new address range with a base of `start` that contains `count` addresses.
    ///
    /// Returns `None` if `count` is zero or the range would wrap around the 64-bit address space.
    pub const fn from_base_size(start: u64, count: u64) -> Option<Self> {
        if count == 0 {
            return None;
        }

        let Some(end) = start.checked_add(count - 1) else {
            return None;
        };

        Some(Self { start, end })
    }

    /// Returns the address at the start of this range.
    pub const fn start(self) -> u64 {
        self.start
    }

    /// Returns the address at the inclusive end of this range.
    pub const fn end(self) -> u64 {
        self.end
    }

    /// Returns the number of bytes in the address range.
    ///
    /// Returns `None` for the range covering every 64-bit address.
    pub const fn count(self) -> Option<u64> {
        (self.end - self.start).checked_add(1)
    }

    /// Returns `true` if the provided address is contained within this address range.
    pub const fn contains(self, address: u64) -> bool {
        self.start <= address && address <= self.end
    }

    /// Returns `true` if `self` and `other` share at least one byte in their ranges.
    pub const fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns the merged range if the two provided ranges are adjacent or overlapping.
    ///
    /// Otherwise, `None` is returned.
    pub const fn merge(self, other: Self) -> Option<Self> {
        let (lower, upper) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };

        if lower.end < upper.start && upper.start - lower.end > 1 {
            return None;
        }

        let end = if lower.end >= upper.end {
            lower.end
        } else {
            upper.end
        };

        Some(Self {
            start: lower.start,
            end,
        })
    }

    /// Returns the intersection of `self` and `other`.
    ///
    /// If the two ranges do not overlap, then `None` is returned.
    pub const fn intersection(self, other: Self) -> Option<Self> {
        let start = if self.start >= other.start {
            self.start
        } else {
            other.start
        };

        let end = if self.end <= other.end {
            self.end
        } else {
            other.end
        };

        Self::new(start, end)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x}]", self.start, self.end)
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::format;

    use super::{AddressRange, AddressSpace};

    #[test]
    fn address_space_bounds() {
        assert!(AddressSpace::new(0).is_none());

        let space = AddressSpace::new(1024).unwrap();
        assert_eq!(space.last_address(), 1023);
        assert_eq!(space.whole_range(), AddressRange::new(0, 1023).unwrap());
        assert!(space.contains(1023));
        assert!(!space.contains(1024));
        assert_eq!(space.highest_varying_bit(), 10);

        // Non power-of-two capacities round down.
        let space = AddressSpace::new(1536).unwrap();
        assert_eq!(space.highest_varying_bit(), 10);
        assert_eq!(AddressSpace::new(1).unwrap().highest_varying_bit(), 0);
        assert_eq!(AddressSpace::new(u64::MAX).unwrap().highest_varying_bit(), 63);
    }

    #[test]
    fn range_construction() {
        assert!(AddressRange::new(5, 4).is_none());
        assert_eq!(AddressRange::new(4, 4).unwrap().count(), Some(1));
        assert_eq!(AddressRange::new(0, u64::MAX).unwrap().count(), None);

        let range = AddressRange::from_base_size(0x1000, 0x1000).unwrap();
        assert_eq!(range.start(), 0x1000);
        assert_eq!(range.end(), 0x1fff);
        assert!(AddressRange::from_base_size(0x1000, 0).is_none());
        assert!(AddressRange::from_base_size(u64::MAX, 2).is_none());
    }

    #[test]
    fn range_overlap_is_inclusive() {
        let a = AddressRange::new(0, 63).unwrap();
        let b = AddressRange::new(63, 127).unwrap();
        let c = AddressRange::new(64, 127).unwrap();

        assert!(a.overlaps(b));
        assert!(b.overlaps(a));
        assert!(!a.overlaps(c));
        assert!(a.contains(63));
        assert!(!a.contains(64));
    }

    #[test]
    fn range_merge_and_intersection() {
        let a = AddressRange::new(0, 63).unwrap();
        let c = AddressRange::new(64, 127).unwrap();
        let d = AddressRange::new(129, 200).unwrap();

        assert_eq!(a.merge(c), AddressRange::new(0, 127));
        assert_eq!(c.merge(a), AddressRange::new(0, 127));
        assert_eq!(c.merge(d), None);
        assert_eq!(a.intersection(c), None);
        assert_eq!(
            AddressRange::new(0, 100).unwrap().intersection(c),
            AddressRange::new(64, 100)
        );
    }

    #[test]
    fn range_display() {
        let range = AddressRange::new(0x40, 0x7f).unwrap();
        assert_eq!(format!("{range}"), "[0x40, 0x7f]");
    }
}
