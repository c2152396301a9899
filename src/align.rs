//! Ordinal alignment between two scripts' raw-word groups.
//!
//! Raw-word groups are assumed to occur in the same linear order in both
//! scripts; alignment is by ordinal position, not semantic matching. That
//! holds when both texts are raw-word-count-aligned and degrades to a
//! visually approximate highlight (never a crash) when they are not.
//! Scripts with reordered or elided words relative to each other are a
//! known limitation of this scheme.

/// Result of mapping one primary raw-word group onto the secondary script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupAlignment {
    pub secondary_group_index: usize,
    /// First secondary token index of the aligned group.
    pub secondary_start: usize,
    /// Token length of the aligned group in the secondary script.
    pub secondary_len: usize,
    /// Token length of the requested group in the primary script.
    pub primary_len: usize,
}

/// Number of raw-word groups described by a chunk-offset sentinel sequence.
pub fn group_count(offsets: &[usize]) -> usize {
    offsets.len().saturating_sub(1)
}

/// Group index containing `token_index`, clamped into the valid range.
pub fn group_of_token(offsets: &[usize], token_index: usize) -> usize {
    let groups = group_count(offsets);
    if groups == 0 {
        return 0;
    }
    for g in 0..groups {
        if token_index < offsets[g + 1] {
            return g;
        }
    }
    groups - 1
}

/// Map `primary_group_index` onto the secondary script's group list.
///
/// Both indices are clamped so the last slot stays reserved for the
/// implicit tail group; degenerate offset vectors (fewer than two entries)
/// yield an empty alignment of zero lengths.
pub fn align_group(
    primary_offsets: &[usize],
    secondary_offsets: &[usize],
    primary_group_index: usize,
) -> GroupAlignment {
    let primary_groups = group_count(primary_offsets);
    let secondary_groups = group_count(secondary_offsets);
    if primary_groups == 0 || secondary_groups == 0 {
        return GroupAlignment::default();
    }

    let clamped = primary_group_index.min(primary_groups.saturating_sub(2));
    let secondary_group_index = clamped.min(secondary_groups.saturating_sub(1));

    let primary_len = primary_offsets[clamped + 1] - primary_offsets[clamped];
    let secondary_start = secondary_offsets[secondary_group_index];
    let secondary_len = secondary_offsets[secondary_group_index + 1] - secondary_start;

    GroupAlignment {
        secondary_group_index,
        secondary_start,
        secondary_len,
        primary_len,
    }
}
