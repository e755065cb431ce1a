//! Traversal engine: plans a cache-friendly loop nest over a shared shape and
//! drives a per-block callback with one offset per operand.
//!
//! Operand 0 is always the destination. Offsets are in elements and relative
//! to each operand's base pointer.

use crate::fuse::{compress_dims, fuse_dims};
use crate::{block, order, Result, StridedError};
use strided_view::layout::contiguous_order;
use strided_view::MemoryOrder;

/// A loop nest whose dimensions are already in iteration order, innermost
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KernelPlan {
    pub(crate) dims: Vec<usize>,
    pub(crate) strides: Vec<Vec<isize>>,
    pub(crate) block: Vec<usize>,
}

/// Build an execution plan for the given operands.
///
/// Pipeline: order, reorder, fuse, compress, block. Ordering first sorts the
/// dimensions by stride importance so that fusion catches contiguous runs
/// regardless of the original axis nesting.
pub(crate) fn build_plan_fused(
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
    elem_size: usize,
) -> KernelPlan {
    let order = order::compute_order(dims, strides_list, dest_index);

    let ordered_dims: Vec<usize> = order.iter().map(|&d| dims[d]).collect();
    let ordered_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| order.iter().map(|&d| strides[d]).collect())
        .collect();
    let ordered_strides_refs: Vec<&[isize]> =
        ordered_strides.iter().map(|s| s.as_slice()).collect();

    let fused_dims = fuse_dims(&ordered_dims, &ordered_strides_refs);
    let (compressed_dims, compressed_strides) = compress_dims(&fused_dims, &ordered_strides);
    let compressed_strides_refs: Vec<&[isize]> =
        compressed_strides.iter().map(|s| s.as_slice()).collect();

    let block = block::compute_block_sizes(&compressed_dims, &compressed_strides_refs, elem_size);

    tracing::trace!(
        ?dims,
        ?order,
        fused = ?compressed_dims,
        ?block,
        "built traversal plan"
    );

    KernelPlan {
        dims: compressed_dims,
        strides: compressed_strides,
        block,
    }
}

// ============================================================================
// Block-based iteration with inner stride callback
// ============================================================================

/// Run `f(offsets, len, inner_strides)` over every innermost block of `plan`.
///
/// `offsets` holds the element offset of the block start for each operand,
/// `len` the number of elements along the innermost dimension, and
/// `inner_strides` the per-operand stride of that dimension. Every logical
/// index is covered exactly once.
#[inline]
pub(crate) fn for_each_inner_block_preordered<F>(plan: &KernelPlan, initial_offsets: &[isize], mut f: F)
where
    F: FnMut(&[isize], usize, &[isize]),
{
    let KernelPlan {
        dims,
        strides,
        block,
    } = plan;

    if dims.iter().any(|&d| d == 0) {
        return;
    }
    if dims.is_empty() {
        let zeros = vec![0isize; initial_offsets.len()];
        f(initial_offsets, 1, &zeros);
        return;
    }

    // Kernels restore the starting offsets on return.
    let mut offsets = initial_offsets.to_vec();

    match dims.len() {
        1 => kernel_1d_inner(dims, block, strides, &mut offsets, &mut f),
        2 => kernel_2d_inner(dims, block, strides, &mut offsets, &mut f),
        3 => kernel_3d_inner(dims, block, strides, &mut offsets, &mut f),
        _ => kernel_nd_inner(dims, block, strides, &mut offsets, &mut f),
    }
}

#[inline]
fn advance(offsets: &mut [isize], strides: &[Vec<isize>], level: usize, steps: isize) {
    for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
        *offset += steps * s[level];
    }
}

#[inline]
fn kernel_1d_inner<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) where
    F: FnMut(&[isize], usize, &[isize]),
{
    let d0 = dims[0];
    let b0 = blocks[0].max(1).min(d0);
    let inner_strides: Vec<isize> = strides.iter().map(|s| s[0]).collect();

    let mut j0 = 0usize;
    while j0 < d0 {
        let blen0 = b0.min(d0 - j0);
        f(offsets, blen0, &inner_strides);
        advance(offsets, strides, 0, blen0 as isize);
        j0 += blen0;
    }
    advance(offsets, strides, 0, -(d0 as isize));
}

/// Outer loop over dim 1, callback over dim 0.
#[inline]
fn kernel_2d_inner<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) where
    F: FnMut(&[isize], usize, &[isize]),
{
    let (d0, d1) = (dims[0], dims[1]);
    let b0 = blocks[0].max(1).min(d0);
    let b1 = blocks[1].max(1).min(d1);
    let inner_strides: Vec<isize> = strides.iter().map(|s| s[0]).collect();

    let mut j1 = 0usize;
    while j1 < d1 {
        let blen1 = b1.min(d1 - j1);

        let mut j0 = 0usize;
        while j0 < d0 {
            let blen0 = b0.min(d0 - j0);
            for _ in 0..blen1 {
                f(offsets, blen0, &inner_strides);
                advance(offsets, strides, 1, 1);
            }
            advance(offsets, strides, 1, -(blen1 as isize));
            advance(offsets, strides, 0, blen0 as isize);
            j0 += blen0;
        }

        advance(offsets, strides, 0, -(d0 as isize));
        advance(offsets, strides, 1, blen1 as isize);
        j1 += blen1;
    }
    advance(offsets, strides, 1, -(d1 as isize));
}

/// Outer loop over dim 2, then dim 1, callback over dim 0.
#[inline]
fn kernel_3d_inner<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) where
    F: FnMut(&[isize], usize, &[isize]),
{
    let (d0, d1, d2) = (dims[0], dims[1], dims[2]);
    let b0 = blocks[0].max(1).min(d0);
    let b1 = blocks[1].max(1).min(d1);
    let b2 = blocks[2].max(1).min(d2);
    let inner_strides: Vec<isize> = strides.iter().map(|s| s[0]).collect();

    let mut j2 = 0usize;
    while j2 < d2 {
        let blen2 = b2.min(d2 - j2);

        let mut j1 = 0usize;
        while j1 < d1 {
            let blen1 = b1.min(d1 - j1);

            let mut j0 = 0usize;
            while j0 < d0 {
                let blen0 = b0.min(d0 - j0);
                for _ in 0..blen2 {
                    for _ in 0..blen1 {
                        f(offsets, blen0, &inner_strides);
                        advance(offsets, strides, 1, 1);
                    }
                    advance(offsets, strides, 1, -(blen1 as isize));
                    advance(offsets, strides, 2, 1);
                }
                advance(offsets, strides, 2, -(blen2 as isize));
                advance(offsets, strides, 0, blen0 as isize);
                j0 += blen0;
            }

            advance(offsets, strides, 0, -(d0 as isize));
            advance(offsets, strides, 1, blen1 as isize);
            j1 += blen1;
        }

        advance(offsets, strides, 1, -(d1 as isize));
        advance(offsets, strides, 2, blen2 as isize);
        j2 += blen2;
    }
    advance(offsets, strides, 2, -(d2 as isize));
}

/// Any rank of 4 or more: blocks along dim 0 only, outer levels step
/// element by element with a carry.
#[inline]
fn kernel_nd_inner<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) where
    F: FnMut(&[isize], usize, &[isize]),
{
    let rank = dims.len();
    let d0 = dims[0];
    let b0 = blocks[0].max(1).min(d0);
    let inner_strides: Vec<isize> = strides.iter().map(|s| s[0]).collect();

    let mut idx = vec![0usize; rank];

    loop {
        let mut j0 = 0usize;
        while j0 < d0 {
            let blen0 = b0.min(d0 - j0);
            f(offsets, blen0, &inner_strides);
            advance(offsets, strides, 0, blen0 as isize);
            j0 += blen0;
        }
        advance(offsets, strides, 0, -(d0 as isize));

        let mut level = 1usize;
        loop {
            if level == rank {
                return;
            }
            advance(offsets, strides, level, 1);
            idx[level] += 1;
            if idx[level] < dims[level] {
                break;
            }
            idx[level] = 0;
            advance(offsets, strides, level, -(dims[level] as isize));
            level += 1;
        }
    }
}

// ============================================================================
// Utility functions
// ============================================================================

pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a.len() != b.len() {
        return Err(StridedError::RankMismatch(a.len(), b.len()));
    }
    if a != b {
        return Err(StridedError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}

/// Returns the common contiguous order if **all** stride lists share the same
/// contiguous layout for `dims`.
#[inline]
pub(crate) fn same_contiguous_layout(
    dims: &[usize],
    strides_list: &[&[isize]],
) -> Option<MemoryOrder> {
    let first = contiguous_order(dims, strides_list.first()?)?;
    for strides in &strides_list[1..] {
        if contiguous_order(dims, strides)? != first {
            return None;
        }
    }
    Some(first)
}

pub(crate) fn total_len(dims: &[usize]) -> usize {
    dims.iter().product()
}
