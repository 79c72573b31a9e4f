//! Dense ordering of todo items within a ticket
//!
//! Positions are always `0..n-1` with no gaps. Requested positions past the
//! end are clamped rather than rejected.

/// Index a new item is inserted at when `requested` is given, else the end
pub fn insertion_index(len: usize, requested: Option<i32>) -> usize {
    requested.map_or(len, |p| usize::try_from(p).unwrap_or(0).min(len))
}

/// Move `id` within `order` to `requested` (clamped). Returns the final
/// index, or `None` when `id` is not part of the ordering.
pub fn move_item(order: &mut Vec<i64>, id: i64, requested: i32) -> Option<usize> {
    let from = order.iter().position(|&x| x == id)?;
    order.remove(from);
    let to = usize::try_from(requested).unwrap_or(0).min(order.len());
    order.insert(to, id);
    Some(to)
}

/// Position assignments for an ordering of ids
pub fn resequence(order: &[i64]) -> Vec<(i64, i32)> {
    order
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, as_position(index)))
        .collect()
}

/// Whether `positions`, in any order, is exactly `0..n-1`
pub fn is_dense(positions: &[i32]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(index, &p)| as_position(index) == p)
}

pub fn as_position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}
