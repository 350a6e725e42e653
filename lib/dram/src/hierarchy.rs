//! The fixed levels of the memory hierarchy and drill-down paths through them.

use std::{error, fmt, str::FromStr};

/// A level of the memory hierarchy, ordered from the outermost to the innermost.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum HierarchyLevel {
    /// A memory channel.
    Channel,
    /// A rank within a channel.
    Rank,
    /// A bank.
    Bank,
    /// A group of banks.
    BankGroup,
    /// A subarray within a bank.
    Subarray,
    /// A row.
    Row,
    /// A column within a row.
    Column,
}

impl HierarchyLevel {
    /// The number of [`HierarchyLevel`]s.
    pub const COUNT: usize = 7;

    /// Every [`HierarchyLevel`] in drill-down order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Channel,
        Self::Rank,
        Self::Bank,
        Self::BankGroup,
        Self::Subarray,
        Self::Row,
        Self::Column,
    ];

    /// Returns the position of the [`HierarchyLevel`] in drill-down order.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the [`HierarchyLevel`] that follows `self` in drill-down order.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Channel => Some(Self::Rank),
            Self::Rank => Some(Self::Bank),
            Self::Bank => Some(Self::BankGroup),
            Self::BankGroup => Some(Self::Subarray),
            Self::Subarray => Some(Self::Row),
            Self::Row => Some(Self::Column),
            Self::Column => None,
        }
    }

    /// Returns the textual representation of the [`HierarchyLevel`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Rank => "rank",
            Self::Bank => "bank",
            Self::BankGroup => "bank-group",
            Self::Subarray => "subarray",
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyLevel {
    type Err = UnknownLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>();

        let level = match normalized.as_str() {
            "channel" => Self::Channel,
            "rank" => Self::Rank,
            "bank" => Self::Bank,
            "bankgroup" => Self::BankGroup,
            "subarray" => Self::Subarray,
            "row" => Self::Row,
            "column" => Self::Column,
            _ => return Err(UnknownLevelError(s.to_owned())),
        };

        Ok(level)
    }
}

/// The provided name does not correspond to any [`HierarchyLevel`].
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct UnknownLevelError(pub String);

impl fmt::Display for UnknownLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hierarchy level {:?}", self.0)
    }
}

impl error::Error for UnknownLevelError {}

/// A drill-down location: a sequence of `(level, identifier)` pairs with strictly increasing
/// levels.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct PathConstraint {
    /// The selected identifiers, ordered by level.
    entries: Vec<(HierarchyLevel, u64)>,
}

impl PathConstraint {
    /// Creates an empty [`PathConstraint`], which selects the whole address space.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a [`PathConstraint`] from `entries`.
    ///
    /// # Errors
    ///
    /// - [`PathError::OutOfOrder`]: Returned if the levels are not strictly increasing.
    pub fn from_entries<I: IntoIterator<Item = (HierarchyLevel, u64)>>(
        entries: I,
    ) -> Result<Self, PathError> {
        let mut path = Self::new();
        for (level, id) in entries {
            path.push(level, id)?;
        }

        Ok(path)
    }

    /// Appends the selection of `id` at `level`.
    ///
    /// # Errors
    ///
    /// - [`PathError::OutOfOrder`]: Returned if `level` does not come after every level already
    ///   present in the [`PathConstraint`].
    pub fn push(&mut self, level: HierarchyLevel, id: u64) -> Result<(), PathError> {
        if let Some(previous) = self.last_level()
            && level <= previous
        {
            return Err(PathError::OutOfOrder { level, previous });
        }

        self.entries.push((level, id));
        Ok(())
    }

    /// Returns a copy of this [`PathConstraint`] extended with `id` at `level`.
    ///
    /// # Errors
    ///
    /// See [`PathConstraint::push`].
    pub fn with(&self, level: HierarchyLevel, id: u64) -> Result<Self, PathError> {
        let mut path = self.clone();
        path.push(level, id)?;
        Ok(path)
    }

    /// Removes and returns the innermost selection.
    pub fn pop(&mut self) -> Option<(HierarchyLevel, u64)> {
        self.entries.pop()
    }

    /// Returns the selections, ordered by level.
    pub fn entries(&self) -> &[(HierarchyLevel, u64)] {
        &self.entries
    }

    /// Returns the identifier selected at `level`, if any.
    pub fn get(&self, level: HierarchyLevel) -> Option<u64> {
        self.entries
            .iter()
            .find_map(|&(entry_level, id)| (entry_level == level).then_some(id))
    }

    /// Returns the innermost selected level.
    pub fn last_level(&self) -> Option<HierarchyLevel> {
        self.entries.last().map(|&(level, _)| level)
    }

    /// Returns the level displayed when drilling down from this [`PathConstraint`].
    pub fn child_level(&self) -> Option<HierarchyLevel> {
        match self.last_level() {
            Some(level) => level.next(),
            None => Some(HierarchyLevel::Channel),
        }
    }

    /// Returns `true` if no level is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of selected levels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for PathConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("(root)");
        }

        for (index, (level, id)) in self.entries.iter().enumerate() {
            if index != 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{level}={id}")?;
        }

        Ok(())
    }
}

/// Various errors that can occur while building a [`PathConstraint`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum PathError {
    /// A level was appended that does not come after the innermost selected level.
    OutOfOrder {
        /// The level that was appended.
        level: HierarchyLevel,
        /// The innermost level already present.
        previous: HierarchyLevel,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { level, previous } => {
                write!(f, "level {level} cannot follow level {previous}")
            }
        }
    }
}

impl error::Error for PathError {}
