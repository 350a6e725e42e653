//! Decoding of physical addresses into hierarchy identifiers.

use std::{error, fmt};

use crate::{
    hierarchy::{HierarchyLevel, PathConstraint},
    mapping::BitMapping,
};

/// Decodes the identifier of `level` for `address`.
///
/// The bit-group at index `k` supplies bit `k` of the identifier. A level without bit-groups
/// always decodes to 0.
///
/// # Errors
///
/// - [`DecodeDiagnostic::InvalidMapping`]: Returned if one of the level's bit-groups failed to
///   parse.
pub fn decode_level(
    address: u64,
    mapping: &BitMapping,
    level: HierarchyLevel,
) -> Result<u64, DecodeDiagnostic> {
    let mut id = 0;
    for (bit, group) in mapping[level].groups().iter().enumerate() {
        let Ok(group) = group else {
            return Err(DecodeDiagnostic::InvalidMapping { level, bit });
        };

        id |= group.evaluate(address) << bit;
    }

    Ok(id)
}

/// Decodes the identifier of every [`HierarchyLevel`] for `address`.
///
/// A level with an invalid mapping does not prevent the other levels from decoding.
pub fn decode(address: u64, mapping: &BitMapping) -> DecodedAddress {
    let levels = HierarchyLevel::ALL.map(|level| decode_level(address, mapping, level));
    DecodedAddress { address, levels }
}

/// The per-level identifiers of a decoded physical address.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct DecodedAddress {
    /// The address that was decoded.
    address: u64,
    /// The outcome for every level, indexed by [`HierarchyLevel::index`].
    levels: [Result<u64, DecodeDiagnostic>; HierarchyLevel::COUNT],
}

impl DecodedAddress {
    /// Returns the address that was decoded.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Returns the decode outcome of `level`.
    pub fn get(&self, level: HierarchyLevel) -> Result<u64, DecodeDiagnostic> {
        self.levels[level.index()]
    }

    /// Returns an [`Iterator`] over every level and its outcome in drill-down order.
    pub fn iter(&self) -> impl Iterator<Item = (HierarchyLevel, Result<u64, DecodeDiagnostic>)> {
        HierarchyLevel::ALL.into_iter().zip(self.levels)
    }

    /// Returns the [`PathConstraint`] that selects every decoded identifier.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeDiagnostic`] if any level failed to decode.
    pub fn path(&self) -> Result<PathConstraint, DecodeDiagnostic> {
        let mut path = PathConstraint::new();
        for (level, id) in self.iter() {
            if path.push(level, id?).is_err() {
                unreachable!("levels are iterated in increasing order");
            }
        }

        Ok(path)
    }
}

/// A per-level problem encountered while decoding an address.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum DecodeDiagnostic {
    /// A bit-group of the level failed to parse.
    InvalidMapping {
        /// The level whose mapping is invalid.
        level: HierarchyLevel,
        /// The identifier bit whose bit-group failed to parse.
        bit: usize,
    },
}

impl fmt::Display for DecodeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMapping { .. } => write!(f, "invalid mapping"),
        }
    }
}

impl error::Error for DecodeDiagnostic {}
