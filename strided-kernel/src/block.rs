//! Cache blocking for the traversal planner.
//!
//! The planner estimates how many bytes one block of iterations touches
//! (counted in cache lines) and shrinks the block until that footprint fits
//! in [`BLOCK_MEMORY_SIZE`].

use crate::fuse::compute_costs;
use crate::{BLOCK_MEMORY_SIZE, CACHE_LINE_SIZE};
use strided_view::auxiliary::index_order;

/// Block sizes for dimensions that are already in iteration order.
pub(crate) fn compute_block_sizes(
    dims: &[usize],
    strides_list: &[&[isize]],
    elem_size: usize,
) -> Vec<usize> {
    if dims.is_empty() {
        return Vec::new();
    }

    let byte_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| strides.iter().map(|&s| s * elem_size as isize).collect())
        .collect();
    let stride_orders: Vec<Vec<usize>> = byte_strides.iter().map(|bs| index_order(bs)).collect();
    let costs = compute_costs(strides_list);

    let byte_stride_refs: Vec<&[isize]> = byte_strides.iter().map(|s| s.as_slice()).collect();
    let stride_order_refs: Vec<&[usize]> = stride_orders.iter().map(|s| s.as_slice()).collect();

    compute_blocks(
        dims,
        &costs,
        &byte_stride_refs,
        &stride_order_refs,
        BLOCK_MEMORY_SIZE,
    )
}

fn compute_blocks(
    dims: &[usize],
    costs: &[isize],
    byte_strides: &[&[isize]],
    stride_orders: &[&[usize]],
    block_size: usize,
) -> Vec<usize> {
    let n = dims.len();
    if n == 0 {
        return vec![];
    }

    if total_memory_region(dims, byte_strides) <= block_size {
        return dims.to_vec();
    }

    // The innermost dimension is the fastest for every operand: keep it whole
    // and block the rest.
    let min_order = stride_orders
        .iter()
        .filter_map(|orders| orders.iter().min().copied())
        .min()
        .unwrap_or(1);
    if stride_orders
        .iter()
        .all(|orders| !orders.is_empty() && orders[0] == min_order)
    {
        let tail_byte_strides: Vec<&[isize]> = byte_strides.iter().map(|s| &s[1..]).collect();
        let tail_stride_orders: Vec<&[usize]> = stride_orders.iter().map(|s| &s[1..]).collect();
        let mut result = vec![dims[0]];
        result.extend(compute_blocks(
            &dims[1..],
            &costs[1..],
            &tail_byte_strides,
            &tail_stride_orders,
            block_size,
        ));
        return result;
    }

    let min_stride = byte_strides
        .iter()
        .filter_map(|s| s.iter().map(|x| x.unsigned_abs()).min())
        .min()
        .unwrap_or(0);
    if min_stride > block_size {
        return vec![1; n];
    }

    let mut blocks = dims.to_vec();

    // Halve until within twice the target.
    while total_memory_region(&blocks, byte_strides) >= 2 * block_size {
        match last_argmax_weighted(&blocks, costs) {
            Some(i) => blocks[i] = (blocks[i] + 1) / 2,
            None => break,
        }
    }

    // Then step down one at a time.
    while total_memory_region(&blocks, byte_strides) > block_size {
        match last_argmax_weighted(&blocks, costs) {
            Some(i) => blocks[i] -= 1,
            None => break,
        }
    }

    blocks
}

/// Bytes touched by one block, rounded to whole cache lines.
///
/// Strides below a cache line add to a contiguous run; larger strides
/// multiply the number of separate cache-line runs.
fn total_memory_region(dims: &[usize], byte_strides: &[&[isize]]) -> usize {
    let mut memory_region = 0usize;

    for strides in byte_strides {
        let mut contiguous_bytes = 0usize;
        let mut num_cache_line_blocks = 1usize;

        for (&d, &s) in dims.iter().zip(strides.iter()) {
            let s_abs = s.unsigned_abs();
            if s_abs < CACHE_LINE_SIZE {
                contiguous_bytes += d.saturating_sub(1) * s_abs;
            } else {
                num_cache_line_blocks = num_cache_line_blocks.saturating_mul(d);
            }
        }

        let contiguous_lines = contiguous_bytes / CACHE_LINE_SIZE + 1;
        memory_region = memory_region.saturating_add(
            CACHE_LINE_SIZE
                .saturating_mul(contiguous_lines)
                .saturating_mul(num_cache_line_blocks),
        );
    }

    memory_region
}

/// Last index maximizing `(blocks[i] - 1) * costs[i]`, skipping unit blocks.
fn last_argmax_weighted(blocks: &[usize], costs: &[isize]) -> Option<usize> {
    let mut max_score = 0isize;
    let mut max_idx = None;

    for (i, (&b, &c)) in blocks.iter().zip(costs.iter()).enumerate() {
        if b <= 1 {
            continue;
        }
        let score = (b as isize - 1) * c;
        if score >= max_score {
            max_score = score;
            max_idx = Some(i);
        }
    }

    max_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_memory_region_contiguous() {
        // 99 * 8 = 792 bytes -> 13 cache lines
        let strides = [8isize];
        assert_eq!(total_memory_region(&[100], &[&strides]), 832);
    }

    #[test]
    fn test_total_memory_region_strided() {
        let strides = [128isize];
        assert_eq!(total_memory_region(&[10], &[&strides]), 640);
    }

    #[test]
    fn test_total_memory_region_broadcast() {
        let strides = [0isize];
        assert_eq!(total_memory_region(&[1000], &[&strides]), CACHE_LINE_SIZE);
    }

    #[test]
    fn test_compute_blocks_fits() {
        let strides = [8isize, 80];
        let orders = [1usize, 2];
        let blocks = compute_blocks(&[10, 10], &[2, 2], &[&strides], &[&orders], BLOCK_MEMORY_SIZE);
        assert_eq!(blocks, vec![10, 10]);
    }

    #[test]
    fn test_compute_blocks_single_operand_not_split() {
        // Every level is fastest-first for the only operand, so nothing is blocked.
        let strides = [8isize, 8000];
        let orders = [1usize, 2];
        let blocks = compute_blocks(
            &[1000, 1000],
            &[2, 2],
            &[&strides],
            &[&orders],
            BLOCK_MEMORY_SIZE,
        );
        assert_eq!(blocks, vec![1000, 1000]);
    }

    #[test]
    fn test_compute_blocks_transposed_operands() {
        let dest = [8isize, 8000];
        let src = [8000isize, 8];
        let dest_orders = index_order(&dest);
        let src_orders = index_order(&src);
        let blocks = compute_blocks(
            &[1000, 1000],
            &[2, 2],
            &[&dest, &src],
            &[&dest_orders, &src_orders],
            BLOCK_MEMORY_SIZE,
        );
        assert!(blocks[0] < 1000 && blocks[1] < 1000);
        assert!(blocks.iter().all(|&b| b >= 1));
    }

    #[test]
    fn test_last_argmax_weighted() {
        // (10-1)*1=9, (20-1)*1=19, (5-1)*2=8
        assert_eq!(last_argmax_weighted(&[10, 20, 5], &[1, 1, 2]), Some(1));
        // Ties resolve to the last index.
        assert_eq!(last_argmax_weighted(&[10, 10], &[1, 1]), Some(1));
        assert_eq!(last_argmax_weighted(&[1, 1], &[1, 1]), None);
    }

    #[test]
    fn test_compute_block_sizes() {
        let strides = [1isize, 100];
        let blocks = compute_block_sizes(&[100, 100], &[&strides], 8);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().zip([100, 100]).all(|(&b, d)| b >= 1 && b <= d));
    }
}
