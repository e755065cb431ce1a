//! Dimension fusion and loop-importance scoring.
//!
//! Every function here works on a shared shape plus one stride list per
//! operand (destination first). None of them touch element data.

/// Fuse neighbouring dimensions that are contiguous for every operand.
///
/// Dimensions `i - 1` and `i` merge when `strides[k][i] == dims[i - 1] *
/// strides[k][i - 1]` holds for all operands `k`. The merged extent lands in
/// `i - 1` and dimension `i` becomes a size-1 placeholder; strides are left
/// as they are, so the result lines up with the input stride lists.
pub fn fuse_dims(dims: &[usize], all_strides: &[&[isize]]) -> Vec<usize> {
    let n = dims.len();
    if n <= 1 || all_strides.is_empty() {
        return dims.to_vec();
    }

    let mut result = dims.to_vec();
    for i in (1..n).rev() {
        let mergeable = all_strides
            .iter()
            .all(|strides| strides[i - 1].checked_mul(result[i - 1] as isize) == Some(strides[i]));
        if mergeable {
            result[i - 1] *= result[i];
            result[i] = 1;
        }
    }
    result
}

/// Drop size-1 dimensions together with their strides.
///
/// A shape made only of size-1 dimensions collapses to a single trivial
/// dimension so the kernels still run their body once.
pub fn compress_dims(dims: &[usize], all_strides: &[Vec<isize>]) -> (Vec<usize>, Vec<Vec<isize>>) {
    let kept: Vec<usize> = (0..dims.len()).filter(|&i| dims[i] != 1).collect();

    if kept.is_empty() {
        if dims.is_empty() {
            return (vec![], all_strides.to_vec());
        }
        let new_strides = all_strides.iter().map(|s| vec![s[0]]).collect();
        return (vec![1], new_strides);
    }

    let new_dims: Vec<usize> = kept.iter().map(|&i| dims[i]).collect();
    let new_strides: Vec<Vec<isize>> = all_strides
        .iter()
        .map(|s| kept.iter().map(|&i| s[i]).collect())
        .collect();

    (new_dims, new_strides)
}

/// Score each dimension for loop ordering.
///
/// A score is one digit per stride rank, smallest rank first: digit `r - 1`
/// sums the weights of the operands that rank the dimension `r`. The first
/// operand (the destination) weighs 2, every other operand 1. Scores compare
/// lexicographically, so any rank count works without overflow. Size-1
/// dimensions score all zeros and sort to the back.
pub fn compute_importance(
    dims: &[usize],
    all_strides: &[&[isize]],
    index_orders: &[Vec<usize>],
) -> Vec<Vec<usize>> {
    let n = dims.len();
    let m = all_strides.len();

    if n == 0 || m == 0 {
        return vec![];
    }

    let mut importance = vec![vec![0usize; n]; n];
    for (k, orders) in index_orders[..m].iter().enumerate() {
        let weight = if k == 0 { 2 } else { 1 };
        for (score, &order) in importance.iter_mut().zip(orders.iter()) {
            score[order - 1] += weight;
        }
    }

    for (score, &dim) in importance.iter_mut().zip(dims.iter()) {
        if dim <= 1 {
            score.fill(0);
        }
    }

    importance
}

/// Permutation that sorts `importance` in descending order (stable).
pub fn sort_by_importance<K: Ord>(importance: &[K]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..importance.len()).collect();
    indices.sort_by(|&a, &b| importance[b].cmp(&importance[a]));
    indices
}

/// Blocking cost of each dimension: `1` for a broadcast axis, otherwise twice
/// the smallest stride magnitude across operands.
pub fn compute_costs(all_strides: &[&[isize]]) -> Vec<isize> {
    let Some(first) = all_strides.first() else {
        return vec![];
    };

    (0..first.len())
        .map(|i| {
            let min = all_strides
                .iter()
                .map(|strides| strides[i].abs())
                .min()
                .unwrap_or(0);
            if min == 0 {
                1
            } else {
                min * 2
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strided_view::auxiliary::index_order;

    #[test]
    fn test_fuse_dims_contiguous() {
        let dims = [3, 4];
        let strides1 = [1isize, 3];
        let strides2 = [1isize, 3];
        let all_strides: Vec<&[isize]> = vec![&strides1, &strides2];
        assert_eq!(fuse_dims(&dims, &all_strides), vec![12, 1]);
    }

    #[test]
    fn test_fuse_dims_non_contiguous() {
        let dims = [3, 4];
        let padded = [1isize, 10];
        assert_eq!(fuse_dims(&dims, &[&padded]), vec![3, 4]);
    }

    #[test]
    fn test_fuse_dims_partial() {
        // dims[0]*strides[0] == strides[1], but 6 != 100
        let dims = [2, 3, 4];
        let strides = [1isize, 2, 100];
        assert_eq!(fuse_dims(&dims, &[&strides]), vec![6, 1, 4]);
    }

    #[test]
    fn test_fuse_dims_requires_all_operands() {
        let dims = [3, 4];
        let contiguous = [1isize, 3];
        let padded = [1isize, 10];
        assert_eq!(fuse_dims(&dims, &[&contiguous, &padded]), vec![3, 4]);
    }

    #[test]
    fn test_fuse_dims_broadcast_operand() {
        // A scalar-like operand with all-zero strides fuses with anything.
        let dims = [3, 4];
        let dest = [1isize, 3];
        let zero = [0isize, 0];
        assert_eq!(fuse_dims(&dims, &[&dest, &zero]), vec![12, 1]);
    }

    #[test]
    fn test_compress_dims() {
        let dims = [6, 1, 4];
        let strides = vec![vec![1isize, 2, 100], vec![4isize, 0, 24]];
        let (d, s) = compress_dims(&dims, &strides);
        assert_eq!(d, vec![6, 4]);
        assert_eq!(s, vec![vec![1, 100], vec![4, 24]]);
    }

    #[test]
    fn test_compress_dims_all_trivial() {
        let dims = [1, 1];
        let strides = vec![vec![5isize, 7]];
        let (d, s) = compress_dims(&dims, &strides);
        assert_eq!(d, vec![1]);
        assert_eq!(s, vec![vec![5]]);

        let (d, s) = compress_dims(&[], &[vec![]]);
        assert!(d.is_empty());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_compute_importance_destination_dominates() {
        let dims = [4usize, 5];
        let dest = [1isize, 4]; // column-major destination
        let src = [5isize, 1]; // row-major source
        let all_strides: Vec<&[isize]> = vec![&dest, &src];
        let index_orders = vec![index_order(&dest), index_order(&src)];

        let importance = compute_importance(&dims, &all_strides, &index_orders);
        assert!(importance[0] > importance[1]);
    }

    #[test]
    fn test_compute_importance_size_one_is_zero() {
        let dims = [3usize, 1, 4];
        let strides = [4isize, 0, 1];
        let importance = compute_importance(&dims, &[&strides], &[index_order(&strides)]);
        assert_eq!(importance[1], vec![0; 3]);
        assert!(importance[2] > importance[0]);
    }

    #[test]
    fn test_compute_importance_high_rank() {
        // Forty unit axes plus a padded 2x2 block, three operands.
        let mut dims = vec![1usize; 40];
        dims.extend([2, 2]);
        let mut strides: Vec<isize> = (0..40).map(|k| 1000 + k).collect();
        strides.extend([3, 1]);
        let all_strides: Vec<&[isize]> = vec![&strides, &strides, &strides];
        let index_orders = vec![index_order(&strides); 3];

        let importance = compute_importance(&dims, &all_strides, &index_orders);
        assert_eq!(importance.len(), 42);
        assert!(importance[41] > importance[40]);
        assert!(importance[..40].iter().all(|score| score.iter().all(|&d| d == 0)));
        let order = sort_by_importance(&importance);
        assert_eq!(&order[..2], &[41, 40]);
    }

    #[test]
    fn test_sort_by_importance() {
        let importance = vec![100u64, 50, 200, 10];
        assert_eq!(sort_by_importance(&importance), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_compute_costs() {
        let strides1 = [1isize, 4, 0];
        let strides2 = [2isize, -1, 0];
        let costs = compute_costs(&[&strides1, &strides2]);
        // min |stride|: [1, 1, 0]
        assert_eq!(costs, vec![2, 2, 1]);
    }
}
