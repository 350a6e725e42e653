//! Configuration of how physical address bits map onto hierarchy identifiers.

use std::{
    error, fmt,
    ops::{Index, IndexMut},
};

use conversion::u32_to_usize;

use crate::{bit_width, hierarchy::HierarchyLevel};

/// An ordered set of physical bit positions whose values are XORed together to produce one bit of
/// a hierarchy identifier.
///
/// Position 0 is the least significant bit of the physical address. Positions that do not exist in
/// a 64-bit address read as 0.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct BitGroup {
    /// The physical bit positions, in the order they were entered.
    positions: Vec<u32>,
}

impl BitGroup {
    /// Creates a new [`BitGroup`] from `positions`.
    pub const fn new(positions: Vec<u32>) -> Self {
        Self { positions }
    }

    /// Creates a [`BitGroup`] that reads the single bit at `position`.
    pub fn single(position: u32) -> Self {
        Self::new(vec![position])
    }

    /// Parses a comma-separated list of bit positions such as `"6"` or `"6, 13, 17"`.
    ///
    /// Empty or whitespace-only text produces an empty [`BitGroup`]. Positions too large for a
    /// `u32` saturate to [`u32::MAX`], which reads as 0 like every position beyond bit 63.
    ///
    /// # Errors
    ///
    /// - [`BitGroupError::InvalidToken`]: Returned if any token is not a non-negative integer.
    pub fn parse(text: &str) -> Result<Self, BitGroupError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let positions = text
            .split(',')
            .map(|token| {
                let token = token.trim();
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(BitGroupError::InvalidToken(token.to_owned()));
                }

                // Digit-only tokens fail to parse only on overflow.
                Ok(token.parse::<u32>().unwrap_or(u32::MAX))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { positions })
    }

    /// Returns the bit positions of this [`BitGroup`].
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Returns `true` if the [`BitGroup`] references no bit positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the lowest and highest referenced bit positions.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        let lowest = self.positions.iter().copied().min()?;
        let highest = self.positions.iter().copied().max()?;
        Some((lowest, highest))
    }

    /// Returns a mask whose parity over an address equals [`BitGroup::evaluate`].
    ///
    /// Repeated positions cancel out.
    pub fn mask(&self) -> u64 {
        self.positions
            .iter()
            .filter_map(|&position| 1u64.checked_shl(position))
            .fold(0, |mask, bit| mask ^ bit)
    }

    /// Returns the XOR of the bits of `address` at every position of this [`BitGroup`].
    pub fn evaluate(&self, address: u64) -> u64 {
        self.positions.iter().fold(0, |value, &position| {
            value ^ (address.checked_shr(position).unwrap_or(0) & 1)
        })
    }
}

impl fmt::Display for BitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, position) in self.positions.iter().enumerate() {
            if index != 0 {
                f.write_str(",")?;
            }
            write!(f, "{position}")?;
        }

        Ok(())
    }
}

/// An error produced while parsing a [`BitGroup`].
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum BitGroupError {
    /// A token was not a non-negative integer.
    InvalidToken(String),
}

impl fmt::Display for BitGroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken(token) => write!(f, "invalid bit position {token:?}"),
        }
    }
}

impl error::Error for BitGroupError {}

/// The configuration of a single [`HierarchyLevel`].
///
/// The number of bit-groups always equals [`bit_width`] of the element count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelConfig {
    /// The number of addressable elements at this level.
    count: u64,
    /// The bit-groups, least significant identifier bit first. Unparsable entries are kept so
    /// that they can be reported.
    groups: Vec<Result<BitGroup, BitGroupError>>,
}

impl LevelConfig {
    /// Creates a [`LevelConfig`] with `count` elements and empty bit-groups.
    pub fn new(count: u64) -> Self {
        Self {
            count,
            groups: vec![Ok(BitGroup::default()); u32_to_usize(bit_width(count))],
        }
    }

    /// Creates a [`LevelConfig`] with `count` elements and the provided bit-groups.
    ///
    /// Missing bit-groups are left empty.
    ///
    /// # Errors
    ///
    /// - [`MappingError::TooManyGroups`]: Returned if more bit-groups are provided than the level
    ///   has identifier bits.
    pub fn with_groups<I: IntoIterator<Item = BitGroup>>(
        count: u64,
        groups: I,
    ) -> Result<Self, MappingError> {
        let mut config = Self::new(count);
        for (index, group) in groups.into_iter().enumerate() {
            config.set_group(index, group)?;
        }

        Ok(config)
    }

    /// Returns the number of addressable elements at this level.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the number of identifier bits at this level.
    pub fn width(&self) -> u32 {
        bit_width(self.count)
    }

    /// Changes the number of elements at this level.
    ///
    /// If the count changes, every bit-group is replaced by an empty placeholder.
    pub fn set_count(&mut self, count: u64) {
        if count != self.count {
            *self = Self::new(count);
        }
    }

    /// Returns the bit-groups, least significant identifier bit first.
    pub fn groups(&self) -> &[Result<BitGroup, BitGroupError>] {
        &self.groups
    }

    /// Replaces the bit-group for identifier bit `index`.
    ///
    /// # Errors
    ///
    /// - [`MappingError::TooManyGroups`]: Returned if `index` is not below the level's width.
    pub fn set_group(&mut self, index: usize, group: BitGroup) -> Result<(), MappingError> {
        self.set_slot(index, Ok(group))
    }

    /// Parses `text` with [`BitGroup::parse`] and stores the outcome for identifier bit `index`.
    ///
    /// An unparsable `text` is stored as such; it is reported when the level is decoded or
    /// resolved.
    ///
    /// # Errors
    ///
    /// - [`MappingError::TooManyGroups`]: Returned if `index` is not below the level's width.
    pub fn set_group_text(&mut self, index: usize, text: &str) -> Result<(), MappingError> {
        self.set_slot(index, BitGroup::parse(text))
    }

    /// Returns `true` if every bit-group parsed successfully.
    pub fn is_valid(&self) -> bool {
        self.groups.iter().all(Result::is_ok)
    }

    /// Stores `slot` for identifier bit `index`.
    fn set_slot(
        &mut self,
        index: usize,
        slot: Result<BitGroup, BitGroupError>,
    ) -> Result<(), MappingError> {
        let width = self.width();
        let Some(entry) = self.groups.get_mut(index) else {
            return Err(MappingError::TooManyGroups { index, width });
        };

        *entry = slot;
        Ok(())
    }
}

/// An error produced while editing a [`LevelConfig`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MappingError {
    /// A bit-group was assigned to an identifier bit the level does not have.
    TooManyGroups {
        /// The identifier bit that was assigned.
        index: usize,
        /// The number of identifier bits of the level.
        width: u32,
    },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyGroups { index, width } => write!(
                f,
                "bit-group {index} assigned to a level with only {width} identifier bits"
            ),
        }
    }
}

impl error::Error for MappingError {}

/// The [`LevelConfig`] of every [`HierarchyLevel`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitMapping {
    /// The configurations, indexed by [`HierarchyLevel::index`].
    levels: [LevelConfig; HierarchyLevel::COUNT],
}

impl BitMapping {
    /// Creates a [`BitMapping`] where every level has no elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this [`BitMapping`] with `level` replaced by `config`.
    #[must_use]
    pub fn with_level(mut self, level: HierarchyLevel, config: LevelConfig) -> Self {
        self[level] = config;
        self
    }

    /// Returns an [`Iterator`] over every level and its configuration in drill-down order.
    pub fn iter(&self) -> impl Iterator<Item = (HierarchyLevel, &LevelConfig)> {
        HierarchyLevel::ALL.into_iter().zip(self.levels.iter())
    }
}

impl Index<HierarchyLevel> for BitMapping {
    type Output = LevelConfig;

    fn index(&self, level: HierarchyLevel) -> &Self::Output {
        &self.levels[level.index()]
    }
}

impl IndexMut<HierarchyLevel> for BitMapping {
    fn index_mut(&mut self, level: HierarchyLevel) -> &mut Self::Output {
        &mut self.levels[level.index()]
    }
}

#[cfg(test)]
mod test {
    use super::{BitGroup, BitGroupError, BitMapping, LevelConfig, MappingError};
    use crate::hierarchy::HierarchyLevel;

    #[test]
    fn parse_bit_groups() {
        assert_eq!(BitGroup::parse("5"), Ok(BitGroup::single(5)));
        assert_eq!(BitGroup::parse(" 6, 13 ,17"), Ok(BitGroup::new(vec![6, 13, 17])));
        assert_eq!(BitGroup::parse(""), Ok(BitGroup::default()));
        assert_eq!(BitGroup::parse("   "), Ok(BitGroup::default()));

        assert_eq!(
            BitGroup::parse("1,x"),
            Err(BitGroupError::InvalidToken("x".to_owned()))
        );
        assert!(BitGroup::parse("1,,2").is_err());
        assert!(BitGroup::parse("-1").is_err());
        assert!(BitGroup::parse("+1").is_err());
        assert!(BitGroup::parse("1.5").is_err());
    }

    #[test]
    fn oversized_positions_saturate() {
        let group = BitGroup::parse("3, 99999999999").unwrap();
        assert_eq!(group.positions(), &[3, u32::MAX]);
        assert_eq!(group.evaluate(0b1000), 1);
        assert_eq!(group.mask(), 0b1000);
    }

    #[test]
    fn bit_group_preserves_order() {
        let group = BitGroup::parse("17,6,13").unwrap();
        assert_eq!(group.positions(), &[17, 6, 13]);
        assert_eq!(group.to_string(), "17,6,13");
        assert_eq!(group.bounds(), Some((6, 17)));
        assert_eq!(BitGroup::default().bounds(), None);
    }

    #[test]
    fn bit_group_xor() {
        let group = BitGroup::parse("0,2").unwrap();
        assert_eq!(group.evaluate(0b001), 1);
        assert_eq!(group.evaluate(0b100), 1);
        assert_eq!(group.evaluate(0b101), 0);
        assert_eq!(group.evaluate(0b010), 0);
        assert_eq!(group.mask(), 0b101);

        // Repeated positions cancel.
        let group = BitGroup::new(vec![3, 3]);
        assert_eq!(group.evaluate(0b1000), 0);
        assert_eq!(group.mask(), 0);

        // Positions beyond 64 bits read as zero.
        let group = BitGroup::new(vec![0, 70]);
        assert_eq!(group.evaluate(u64::MAX), 1);
        assert_eq!(group.mask(), 1);

        assert_eq!(BitGroup::default().evaluate(u64::MAX), 0);
    }

    #[test]
    fn level_config_tracks_width() {
        let mut config = LevelConfig::new(4);
        assert_eq!(config.width(), 2);
        assert_eq!(config.groups().len(), 2);

        config.set_group(1, BitGroup::single(6)).unwrap();
        config.set_count(4);
        assert_eq!(config.groups()[1], Ok(BitGroup::single(6)));

        // Changing the count discards existing assignments.
        config.set_count(8);
        assert_eq!(config.groups().len(), 3);
        assert!(config.groups().iter().all(|g| g == &Ok(BitGroup::default())));

        config.set_count(1);
        assert!(config.groups().is_empty());
        config.set_count(0);
        assert!(config.groups().is_empty());
    }

    #[test]
    fn level_config_group_assignment() {
        let mut config = LevelConfig::new(2);
        assert_eq!(
            config.set_group(1, BitGroup::single(3)),
            Err(MappingError::TooManyGroups { index: 1, width: 1 })
        );

        config.set_group_text(0, "4,x").unwrap();
        assert!(!config.is_valid());
        config.set_group_text(0, "4,5").unwrap();
        assert!(config.is_valid());

        assert!(LevelConfig::with_groups(2, [BitGroup::single(0), BitGroup::single(1)]).is_err());
        let config = LevelConfig::with_groups(8, [BitGroup::single(0)]).unwrap();
        assert_eq!(config.groups().len(), 3);
    }

    #[test]
    fn mapping_is_indexed_by_level() {
        let mapping =
            BitMapping::new().with_level(HierarchyLevel::Bank, LevelConfig::new(4));
        assert_eq!(mapping[HierarchyLevel::Bank].count(), 4);
        assert_eq!(mapping[HierarchyLevel::Row].count(), 0);

        let levels = mapping.iter().map(|(level, _)| level).collect::<Vec<_>>();
        assert_eq!(levels, HierarchyLevel::ALL);
    }
}
