//! Assignment of lazy expressions into strided destinations.
//!
//! Two strategies share one traversal engine:
//!
//! - in-place compound assignment (`a += b`, [`StridedArray::combine_in_place`])
//!   reads and writes the destination at every logical index;
//! - non-aliasing assignment ([`noalias`], [`assign_into`]) overwrites the
//!   destination with the value of an expression that does not read it.
//!
//! The destination always keeps its own shape and strides: values are written
//! through its offset function, whatever the layouts of the operands.
//!
//! ```rust
//! use strided_kernel::{noalias, MemoryOrder, StridedArray};
//!
//! let a = StridedArray::<i32>::from_fn_row_major(&[2, 3], |idx| (idx[0] * 3 + idx[1] + 1) as i32);
//! let mut dest = StridedArray::<i32>::col_major(&[2, 3]);
//! noalias(&mut dest).assign(&a * 2).unwrap();
//!
//! assert_eq!(dest.strides(), &[1, 2]);
//! assert_eq!(dest.data(), &[2, 8, 4, 10, 6, 12]);
//! assert!(dest.eq_values(&StridedArray::from_expr(&a * 2, MemoryOrder::RowMajor).unwrap()));
//! ```

use strided_traits::{BinaryOp, ScalarBase};
use strided_view::{Layout, StridedViewMut};

use crate::array::StridedArray;
use crate::expr::{Expression, Leaf};
use crate::kernel::{
    build_plan_fused, ensure_same_shape, for_each_inner_block_preordered, same_contiguous_layout,
    total_len,
};
use crate::Result;

/// Write `expr[idx]` into `dest[idx]` for every logical index.
///
/// Fails if `expr` is shaped and its shape differs from `dest`'s; `dest` is
/// untouched in that case.
pub fn assign_into<T, E>(dest: &mut StridedViewMut<'_, T>, expr: E) -> Result<()>
where
    T: Copy,
    E: Expression<T>,
{
    if let Some(dims) = expr.dims() {
        ensure_same_shape(dest.dims(), dims)?;
    }
    let leaves = checked_leaves(dest.dims(), &expr)?;
    drive(dest, &expr, &leaves, |dst, v| *dst = v);
    Ok(())
}

/// `dest[idx] = op(dest[idx], expr[idx])` for every logical index.
pub fn combine_into<T, Op, E>(dest: &mut StridedViewMut<'_, T>, _op: Op, expr: E) -> Result<()>
where
    T: Copy,
    Op: BinaryOp<T>,
    E: Expression<T>,
{
    if let Some(dims) = expr.dims() {
        ensure_same_shape(dest.dims(), dims)?;
    }
    let leaves = checked_leaves(dest.dims(), &expr)?;
    tracing::trace!(op = Op::SYMBOL, dims = ?dest.dims(), "combine into destination");
    drive(dest, &expr, &leaves, |dst, v| *dst = Op::apply(*dst, v));
    Ok(())
}

/// Evaluate `expr` into a freshly allocated array with the given layout.
///
/// A shaped expression must match `layout`'s shape; a shapeless one is
/// broadcast to it.
pub fn materialize<T, E>(expr: E, layout: Layout) -> Result<StridedArray<T>>
where
    T: ScalarBase,
    E: Expression<T>,
{
    if let Some(dims) = expr.dims() {
        ensure_same_shape(layout.dims(), dims)?;
    }
    let leaves = checked_leaves(layout.dims(), &expr)?;
    let mut out = StridedArray::from_elem(layout, T::zero());
    drive(&mut out.view_mut(), &expr, &leaves, |dst, v| *dst = v);
    Ok(out)
}

/// A destination that is known not to be read by the expression assigned
/// into it.
///
/// The exclusive borrow makes the guarantee static: an expression that reads
/// the destination cannot be built while a `NoAlias` for it is alive.
#[derive(Debug)]
pub struct NoAlias<'a, T> {
    dest: &'a mut StridedArray<T>,
}

/// Wrap a destination for non-aliasing assignment.
pub fn noalias<T>(dest: &mut StridedArray<T>) -> NoAlias<'_, T> {
    NoAlias { dest }
}

impl<T: Copy> NoAlias<'_, T> {
    /// Overwrite every logical element with the expression's value.
    pub fn assign<E: Expression<T>>(self, expr: E) -> Result<()> {
        assign_into(&mut self.dest.view_mut(), expr)
    }

    /// Combine every logical element with the expression's value.
    pub fn combine<Op: BinaryOp<T>, E: Expression<T>>(self, op: Op, expr: E) -> Result<()> {
        combine_into(&mut self.dest.view_mut(), op, expr)
    }
}

/// Collect the array leaves of `expr`, checking each against `dims`.
///
/// The shape an expression reports is not trusted: the kernel reads every
/// leaf by offset over `dims`, so each leaf's own shape must match.
pub(crate) fn checked_leaves<'s, T, E>(dims: &[usize], expr: &'s E) -> Result<Vec<Leaf<'s, T>>>
where
    T: Copy,
    E: Expression<T> + ?Sized,
{
    let mut leaves = Vec::new();
    expr.leaves(&mut leaves);
    for leaf in &leaves {
        ensure_same_shape(dims, leaf.dims).map_err(|err| {
            tracing::debug!(?dims, leaf = ?leaf.dims, "expression leaf disagrees with destination");
            err
        })?;
    }
    Ok(leaves)
}

/// Run `write(&mut dest[idx], expr[idx])` once per logical index of `dest`.
///
/// `leaves` must come from [`checked_leaves`] for `dest`'s shape (or be empty
/// for an expression without array leaves). Operands that all share one
/// contiguous layout are walked as a flat run; anything else goes through the
/// blocked kernel.
pub(crate) fn drive<T, E, W>(
    dest: &mut StridedViewMut<'_, T>,
    expr: &E,
    leaves: &[Leaf<'_, T>],
    write: W,
) where
    T: Copy,
    E: Expression<T> + ?Sized,
    W: Fn(&mut T, T),
{
    let dims = dest.dims().to_vec();
    let total = total_len(&dims);
    if total == 0 {
        return;
    }

    let leaf_ptrs: Vec<*const T> = leaves.iter().map(|leaf| leaf.ptr).collect();

    let dest_strides = dest.strides().to_vec();
    let mut strides_list: Vec<&[isize]> = Vec::with_capacity(leaves.len() + 1);
    strides_list.push(&dest_strides);
    strides_list.extend(leaves.iter().map(|leaf| leaf.strides));

    let dest_ptr = dest.as_mut_ptr();

    if same_contiguous_layout(&dims, &strides_list).is_some() {
        tracing::trace!(
            rank = dims.len(),
            leaves = leaf_ptrs.len(),
            total,
            "contiguous assignment"
        );
        for i in 0..total as isize {
            // SAFETY: every operand has `dest`'s shape and is contiguous over
            // `total` elements from its base pointer; `dest` is not a leaf.
            unsafe {
                let value = expr.consume(&mut leaf_ptrs.iter().map(|&p| *p.offset(i)));
                write(&mut *dest_ptr.offset(i), value);
            }
        }
        return;
    }

    let plan = build_plan_fused(&dims, &strides_list, Some(0), std::mem::size_of::<T>());
    tracing::trace!(
        rank = dims.len(),
        leaves = leaf_ptrs.len(),
        total,
        "strided assignment"
    );
    let initial_offsets = vec![0isize; strides_list.len()];
    for_each_inner_block_preordered(&plan, &initial_offsets, |offsets, len, inner| {
        for k in 0..len as isize {
            // SAFETY: the plan only produces offsets of logical indices of
            // `dims`, which every operand layout was validated to cover.
            unsafe {
                let value = expr.consume(
                    &mut leaf_ptrs
                        .iter()
                        .enumerate()
                        .map(|(j, &p)| *p.offset(offsets[j + 1] + k * inner[j + 1])),
                );
                write(&mut *dest_ptr.offset(offsets[0] + k * inner[0]), value);
            }
        }
    });
}
