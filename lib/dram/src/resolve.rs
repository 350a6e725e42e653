//! Resolution of hierarchy selections into the physical address ranges that decode to them.
//!
//! Every bit-group of every selected level becomes a parity constraint over the physical address.
//! The constrained bits are enumerated by brute force between the lowest and highest referenced
//! bit; every candidate stands for the block of `2^lowest` bytes that share its constrained bits.
//! Since no constraint reads a bit above the highest referenced bit, the membership pattern
//! repeats every `2^(highest + 1)` bytes and is replicated across the rest of the address space.

use std::{error, fmt, iter};

use memory::address::{AddressRange, AddressSpace};
use tracing::{debug, trace};

use crate::{
    hierarchy::{HierarchyLevel, PathConstraint, PathError},
    mapping::BitMapping,
};

/// The default value of [`ResolveLimits::max_bit_span`].
pub const DEFAULT_MAX_BIT_SPAN: u32 = 24;

/// Bounds on the work a single resolution may perform.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ResolveLimits {
    /// The largest permitted distance between the lowest and highest constrained bit.
    ///
    /// A span of `n` enumerates `2^(n + 1)` candidates.
    pub max_bit_span: u32,
    /// The largest number of ranges a single resolution may produce, if any.
    pub max_ranges: Option<usize>,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_bit_span: DEFAULT_MAX_BIT_SPAN,
            max_ranges: None,
        }
    }
}

/// Returns the ordered, disjoint and maximal [`AddressRange`]s whose addresses decode to every
/// identifier selected by `path`.
///
/// An empty `path` selects the whole [`AddressSpace`]. An empty result is valid and means that no
/// address satisfies every constraint.
///
/// # Errors
///
/// - [`ResolveError::InvalidMapping`]: Returned if a bit-group of a selected level failed to
///   parse.
/// - [`ResolveError::IdentifierOutOfRange`]: Returned if a selected identifier has more bits than
///   its level.
/// - [`ResolveError::BitOutOfRange`]: Returned if a constraint references a bit above
///   [`AddressSpace::highest_varying_bit`].
/// - [`ResolveError::SpanTooLarge`]: Returned if the constrained bits span more than
///   [`ResolveLimits::max_bit_span`] positions.
/// - [`ResolveError::TooManyRanges`]: Returned if [`ResolveLimits::max_ranges`] is set and more
///   ranges would be produced.
pub fn resolve_ranges(
    path: &PathConstraint,
    mapping: &BitMapping,
    space: AddressSpace,
    limits: ResolveLimits,
) -> Result<Vec<AddressRange>, ResolveError> {
    resolve_entries(path.entries().iter().copied(), mapping, space, limits)
}

/// Resolves every identifier `0..count` of `level` beneath `path`, as displayed by one drill-down
/// view.
///
/// Each child is resolved lazily when the returned [`Iterator`] is advanced.
///
/// # Errors
///
/// - [`PathError::OutOfOrder`]: Returned if `level` does not come after every level of `path`.
pub fn resolve_children<'a>(
    path: &'a PathConstraint,
    level: HierarchyLevel,
    mapping: &'a BitMapping,
    space: AddressSpace,
    limits: ResolveLimits,
) -> Result<impl Iterator<Item = (u64, Result<Vec<AddressRange>, ResolveError>)> + 'a, PathError> {
    path.with(level, 0)?;

    let count = mapping[level].count();
    debug!(%path, %level, count, "resolving children");

    Ok((0..count).map(move |id| {
        let entries = path.entries().iter().copied().chain(iter::once((level, id)));
        (id, resolve_entries(entries, mapping, space, limits))
    }))
}

/// Resolves the selections in `entries`, which must be ordered by level.
fn resolve_entries<I: Iterator<Item = (HierarchyLevel, u64)>>(
    entries: I,
    mapping: &BitMapping,
    space: AddressSpace,
    limits: ResolveLimits,
) -> Result<Vec<AddressRange>, ResolveError> {
    let Some(set) = collect_constraints(entries, mapping)? else {
        return Ok(vec![space.whole_range()]);
    };

    let highest_varying_bit = space.highest_varying_bit();
    if set.highest_bit > highest_varying_bit {
        return Err(ResolveError::BitOutOfRange {
            bit: set.highest_bit,
            highest: highest_varying_bit,
        });
    }

    let span = set.highest_bit - set.lowest_bit;
    if span > limits.max_bit_span {
        return Err(ResolveError::SpanTooLarge {
            span,
            limit: limits.max_bit_span,
        });
    }

    debug!(
        constraints = set.constraints.len(),
        lowest_bit = set.lowest_bit,
        highest_bit = set.highest_bit,
        capacity = space.capacity(),
        "resolving ranges"
    );

    // `None` stands for a period of 2^64 bytes.
    let period = 1u64.checked_shl(set.highest_bit + 1);
    let scan_end = period.map_or(space.capacity(), |period| period.min(space.capacity()));
    let runs = scan(&set, scan_end, limits.max_ranges)?;

    let ranges = match period {
        Some(period) if period < space.capacity() => {
            replicate(&runs, period, space, limits.max_ranges)?
        }
        _ => runs,
    };

    debug!(ranges = ranges.len(), "resolved ranges");
    Ok(ranges)
}

/// A requirement that the parity of the address bits selected by `mask` equals `required`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Constraint {
    /// The address bits XORed together.
    mask: u64,
    /// The required result, either 0 or 1.
    required: u64,
}

impl Constraint {
    /// Returns `true` if `address` satisfies the [`Constraint`].
    fn holds(self, address: u64) -> bool {
        u64::from((address & self.mask).count_ones() & 1) == self.required
    }
}

/// The non-vacuous constraints of a selection and the bits they reference.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ConstraintSet {
    /// The constraints, all of which must hold.
    constraints: Vec<Constraint>,
    /// The lowest referenced bit position.
    lowest_bit: u32,
    /// The highest referenced bit position.
    highest_bit: u32,
}

/// Derives one [`Constraint`] per non-empty bit-group of every selected level.
///
/// Returns `None` if no constraint remains.
fn collect_constraints<I: Iterator<Item = (HierarchyLevel, u64)>>(
    entries: I,
    mapping: &BitMapping,
) -> Result<Option<ConstraintSet>, ResolveError> {
    let mut constraints = Vec::new();
    let mut lowest_bit = u32::MAX;
    let mut highest_bit = 0;

    for (level, id) in entries {
        let config = &mapping[level];
        let width = config.width();
        if id.checked_shr(width).is_some_and(|excess| excess != 0) {
            return Err(ResolveError::IdentifierOutOfRange { level, id, width });
        }

        for (bit, group) in config.groups().iter().enumerate() {
            let Ok(group) = group else {
                return Err(ResolveError::InvalidMapping { level, bit });
            };
            let Some((low, high)) = group.bounds() else {
                continue;
            };

            lowest_bit = lowest_bit.min(low);
            highest_bit = highest_bit.max(high);
            constraints.push(Constraint {
                mask: group.mask(),
                required: (id >> bit) & 1,
            });
        }
    }

    if constraints.is_empty() {
        return Ok(None);
    }

    Ok(Some(ConstraintSet {
        constraints,
        lowest_bit,
        highest_bit,
    }))
}

/// Evaluates every candidate block below `end` and returns the runs of satisfying addresses.
fn scan(
    set: &ConstraintSet,
    end: u64,
    limit: Option<usize>,
) -> Result<Vec<AddressRange>, ResolveError> {
    let stride = 1u64 << set.lowest_bit;

    let mut ranges = Vec::new();
    let mut run_start = None;
    let mut address = 0u64;
    while address < end {
        let member = set
            .constraints
            .iter()
            .all(|constraint| constraint.holds(address));

        match (member, run_start) {
            (true, None) => run_start = Some(address),
            (false, Some(start)) => {
                push_range(&mut ranges, start, address - 1, limit)?;
                run_start = None;
            }
            _ => {}
        }

        let Some(next) = address.checked_add(stride) else {
            break;
        };
        address = next;
    }

    if let Some(start) = run_start {
        push_range(&mut ranges, start, end - 1, limit)?;
    }

    Ok(ranges)
}

/// Repeats the runs found in the first `period` bytes across the whole address space.
fn replicate(
    runs: &[AddressRange],
    period: u64,
    space: AddressSpace,
    limit: Option<usize>,
) -> Result<Vec<AddressRange>, ResolveError> {
    let Some(first) = runs.first() else {
        return Ok(Vec::new());
    };
    if runs.len() == 1 && first.start() == 0 && first.end() == period - 1 {
        return Ok(vec![space.whole_range()]);
    }

    trace!(period, runs = runs.len(), "replicating runs");

    let mut ranges = Vec::new();
    let mut base = 0u64;
    'periods: while space.contains(base) {
        for run in runs {
            let Some(start) = base.checked_add(run.start()) else {
                break 'periods;
            };
            if !space.contains(start) {
                break 'periods;
            }

            let end = base.saturating_add(run.end()).min(space.last_address());
            push_range(&mut ranges, start, end, limit)?;
        }

        let Some(next) = base.checked_add(period) else {
            break;
        };
        base = next;
    }

    Ok(ranges)
}

/// Appends `[start, end]` to `ranges`, merging it into the last range if they are adjacent.
fn push_range(
    ranges: &mut Vec<AddressRange>,
    start: u64,
    end: u64,
    limit: Option<usize>,
) -> Result<(), ResolveError> {
    let Some(range) = AddressRange::new(start, end) else {
        unreachable!("run [{start:#x}, {end:#x}] ends before it starts");
    };

    if let Some(last) = ranges.last_mut()
        && let Some(merged) = last.merge(range)
    {
        *last = merged;
        return Ok(());
    }

    if let Some(limit) = limit
        && ranges.len() >= limit
    {
        return Err(ResolveError::TooManyRanges { limit });
    }

    ranges.push(range);
    Ok(())
}

/// Various reasons a resolution can be aborted.
///
/// An aborted resolution is distinct from a resolution that finds no matching ranges.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ResolveError {
    /// A bit-group of a selected level failed to parse.
    InvalidMapping {
        /// The level whose mapping is invalid.
        level: HierarchyLevel,
        /// The identifier bit whose bit-group failed to parse.
        bit: usize,
    },
    /// A selected identifier does not fit in the identifier bits of its level.
    IdentifierOutOfRange {
        /// The level of the identifier.
        level: HierarchyLevel,
        /// The selected identifier.
        id: u64,
        /// The number of identifier bits of the level.
        width: u32,
    },
    /// A constraint references a bit that never varies within the address space.
    BitOutOfRange {
        /// The highest referenced bit.
        bit: u32,
        /// The highest bit the address space permits.
        highest: u32,
    },
    /// The constrained bits span too many positions to enumerate.
    SpanTooLarge {
        /// The distance between the lowest and highest constrained bit.
        span: u32,
        /// The configured [`ResolveLimits::max_bit_span`].
        limit: u32,
    },
    /// The resolution would produce more ranges than permitted.
    TooManyRanges {
        /// The configured [`ResolveLimits::max_ranges`].
        limit: usize,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMapping { level, bit } => {
                write!(f, "invalid mapping for bit {bit} of level {level}")
            }
            Self::IdentifierOutOfRange { level, id, width } => write!(
                f,
                "identifier {id} does not fit in the {width} identifier bits of level {level}"
            ),
            Self::BitOutOfRange { bit, highest } => write!(
                f,
                "bit {bit} never varies within the address space (highest usable bit is {highest})"
            ),
            Self::SpanTooLarge { span, limit } => write!(
                f,
                "constrained bits span {span} positions, exceeding the limit of {limit}"
            ),
            Self::TooManyRanges { limit } => {
                write!(f, "resolution produced more than {limit} ranges")
            }
        }
    }
}

impl error::Error for ResolveError {}
