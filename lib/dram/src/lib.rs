//! Decoding of physical addresses into memory hierarchy identifiers and resolution of hierarchy
//! identifiers back into physical address ranges.
//!
//! Every level of the hierarchy derives its identifier from a set of bit-groups, each of which
//! XORs together an arbitrary set of physical address bits. The engine is stateless: every
//! operation takes an explicit [`BitMapping`] and [`AddressSpace`] snapshot.

pub mod decode;
pub mod hierarchy;
pub mod mapping;
pub mod overlap;
pub mod resolve;

pub use memory::address::{AddressRange, AddressSpace};

pub use crate::{
    decode::{DecodeDiagnostic, DecodedAddress, decode, decode_level},
    hierarchy::{HierarchyLevel, PathConstraint, PathError, UnknownLevelError},
    mapping::{BitGroup, BitGroupError, BitMapping, LevelConfig, MappingError},
    overlap::{Overlap, VmDescriptor, VmParseError, classify},
    resolve::{ResolveError, ResolveLimits, resolve_children, resolve_ranges},
};

/// Returns the number of bits required to distinguish the identifiers `0..count`.
///
/// A `count` of 0 or 1 requires no bits.
pub const fn bit_width(count: u64) -> u32 {
    if count <= 1 {
        return 0;
    }

    u64::BITS - (count - 1).leading_zeros()
}

#[cfg(test)]
mod test {
    use super::bit_width;

    #[test]
    fn bit_width_table() {
        let table = [
            (0, 0),
            (1, 0),
            (2, 1),
            (3, 2),
            (4, 2),
            (5, 3),
            (8, 3),
            (9, 4),
            (16, 4),
            (17, 5),
            (1 << 20, 20),
            ((1 << 20) + 1, 21),
        ];

        for (count, width) in table {
            assert_eq!(bit_width(count), width, "bit_width({count})");
        }
    }

    #[test]
    fn bit_width_power_of_two_boundaries() {
        for k in 1..64 {
            let power = 1u64 << k;
            assert_eq!(bit_width(power), k, "bit_width(2^{k})");
            assert_eq!(bit_width(power + 1), k + 1, "bit_width(2^{k} + 1)");
        }

        assert_eq!(bit_width(u64::MAX), 64);
    }
}
