//! Loop ordering for the traversal planner.

use crate::fuse::{compute_importance, sort_by_importance};
use strided_view::auxiliary::index_order;

/// Compute the iteration order of the dimensions, innermost first.
///
/// Each operand's strides are ranked with [`index_order`], the ranks are
/// combined by [`compute_importance`] with the operand at `dest_index`
/// weighted twice, and the dimensions are sorted by descending importance.
/// Dimensions of size 1 end up last.
pub(crate) fn compute_order(
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
) -> Vec<usize> {
    let rank = dims.len();
    if rank == 0 {
        return Vec::new();
    }
    if strides_list.is_empty() {
        return (0..rank).collect();
    }

    let mut ordered: Vec<&[isize]> = strides_list.to_vec();
    if let Some(dest) = dest_index.filter(|&d| d != 0 && d < ordered.len()) {
        let dest_strides = ordered.remove(dest);
        ordered.insert(0, dest_strides);
    }

    // Size-1 dimensions take no part in ranking.
    let index_orders: Vec<Vec<usize>> = ordered
        .iter()
        .map(|strides| {
            let masked: Vec<isize> = strides
                .iter()
                .zip(dims.iter())
                .map(|(&s, &d)| if d <= 1 { 0 } else { s })
                .collect();
            index_order(&masked)
        })
        .collect();
    let importance = compute_importance(dims, &ordered, &index_orders);
    sort_by_importance(&importance)
}
