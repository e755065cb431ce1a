//! Stride bookkeeping shared by layouts and the traversal planner.

/// Rank of each stride among the non-zero strides, by magnitude.
///
/// `result[i]` is one plus the number of non-zero strides whose magnitude is
/// strictly smaller than `|strides[i]|`. Zero strides (broadcast axes) rank 1,
/// tied strides share a rank.
pub fn index_order(strides: &[isize]) -> Vec<usize> {
    strides
        .iter()
        .map(|&s| {
            let si = s.unsigned_abs();
            if si == 0 {
                return 1;
            }
            1 + strides
                .iter()
                .filter(|&&t| t != 0 && t.unsigned_abs() < si)
                .count()
        })
        .collect()
}

/// Axes sorted from slowest (largest `|stride|`) to fastest.
///
/// Ties keep their axis order, so a row-major layout yields the identity
/// permutation. Feeding the result to [`permuted_strides`](crate::permuted_strides)
/// reproduces the stride ordering of `strides` on a dense buffer.
pub fn axis_order(strides: &[isize]) -> Vec<usize> {
    let mut axes: Vec<usize> = (0..strides.len()).collect();
    axes.sort_by(|&a, &b| strides[b].unsigned_abs().cmp(&strides[a].unsigned_abs()));
    axes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        // 4 is largest, 1 is smallest, 2 is middle
        assert_eq!(index_order(&[4, 1, 2]), vec![3, 1, 2]);
    }

    #[test]
    fn test_index_order_with_zero() {
        assert_eq!(index_order(&[4, 0, 2]), vec![2, 1, 1]);
    }

    #[test]
    fn test_index_order_negative_strides() {
        assert_eq!(index_order(&[-4, 1, -2]), vec![3, 1, 2]);
    }

    #[test]
    fn test_index_order_tied_strides() {
        assert_eq!(index_order(&[2, 2, 1]), vec![2, 2, 1]);
        assert_eq!(index_order(&[3, 3, 3]), vec![1, 1, 1]);
    }

    #[test]
    fn test_axis_order() {
        assert_eq!(axis_order(&[8, 4, 1]), vec![0, 1, 2]);
        assert_eq!(axis_order(&[1, 3, 6]), vec![2, 1, 0]);
        assert_eq!(axis_order(&[8, 1, 2]), vec![0, 2, 1]);
        assert_eq!(axis_order(&[4, -12, 1]), vec![1, 0, 2]);
    }

    #[test]
    fn test_axis_order_stable_on_ties() {
        assert_eq!(axis_order(&[4, 0, 1]), vec![0, 2, 1]);
        assert_eq!(axis_order(&[1, 1]), vec![0, 1]);
    }
}
