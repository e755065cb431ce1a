//! Lazy element-wise expressions.
//!
//! An expression is a tree whose leaves are arrays (or views) and broadcast
//! scalars, and whose inner nodes are binary operations. Building one never
//! reads an element; evaluation happens when the tree is assigned into a
//! destination.
//!
//! ```rust
//! use strided_kernel::{Expression, StridedArray};
//!
//! let a = StridedArray::<i32>::from_fn_row_major(&[2, 3], |idx| (idx[0] * 3 + idx[1] + 1) as i32);
//! let e = &a * 2 + 1;
//! assert_eq!(e.dims(), Some(&[2usize, 3][..]));
//! assert_eq!(e.eval(&[1, 2]), 13);
//! ```
//!
//! Two kinds of evaluation coexist:
//!
//! - [`Expression::eval`] computes the value at one logical index. It is pure
//!   and is what the tests and random-access callers use.
//! - The traversal kernel instead collects the array leaves once with
//!   [`Expression::leaves`], walks all operands by offset, and folds the values
//!   read at the current position through [`Expression::consume`]. Leaves are
//!   visited left to right in both methods, which is what keeps the two in
//!   step.

use std::ops::{Add, Div, Mul, Sub};

use strided_traits::{BinaryOp, Divides, Minus, Multiplies, Plus, ScalarBase};
use strided_view::StridedView;

use crate::array::StridedArray;
use crate::kernel::ensure_same_shape;
use crate::Result;

/// An array leaf as seen by the traversal kernel: a pointer to the element at
/// the leaf's base offset, the shape the leaf's buffer was validated for, and
/// one stride per dimension.
///
/// Leaves can only be created from arrays and views, so `dims` and `strides`
/// always describe memory the pointer is allowed to read.
#[derive(Debug, Clone, Copy)]
pub struct Leaf<'s, T> {
    pub(crate) ptr: *const T,
    pub(crate) dims: &'s [usize],
    pub(crate) strides: &'s [isize],
}

impl<'s, T> Leaf<'s, T> {
    pub(crate) fn new(ptr: *const T, dims: &'s [usize], strides: &'s [isize]) -> Self {
        Self { ptr, dims, strides }
    }

    /// Shape of the array or view behind this leaf.
    pub fn dims(&self) -> &'s [usize] {
        self.dims
    }
}

/// A lazily evaluated element-wise value over a logical shape.
pub trait Expression<T: Copy> {
    /// Logical shape, or `None` when the expression broadcasts to any shape.
    fn dims(&self) -> Option<&[usize]>;

    /// Value at a logical index.
    ///
    /// Panics if `index` is out of bounds for a shaped expression.
    fn eval(&self, index: &[usize]) -> T;

    /// Append the array leaves of this expression, left to right.
    fn leaves<'s>(&'s self, out: &mut Vec<Leaf<'s, T>>);

    /// Combine one value per array leaf, in [`leaves`](Self::leaves) order.
    fn consume<I: Iterator<Item = T>>(&self, values: &mut I) -> T;
}

impl<T: Copy, E: Expression<T> + ?Sized> Expression<T> for &E {
    #[inline]
    fn dims(&self) -> Option<&[usize]> {
        (**self).dims()
    }

    #[inline]
    fn eval(&self, index: &[usize]) -> T {
        (**self).eval(index)
    }

    #[inline]
    fn leaves<'s>(&'s self, out: &mut Vec<Leaf<'s, T>>) {
        (**self).leaves(out)
    }

    #[inline]
    fn consume<I: Iterator<Item = T>>(&self, values: &mut I) -> T {
        (**self).consume(values)
    }
}

impl<T: Copy> Expression<T> for StridedView<'_, T> {
    #[inline]
    fn dims(&self) -> Option<&[usize]> {
        Some(StridedView::dims(self))
    }

    #[inline]
    fn eval(&self, index: &[usize]) -> T {
        self.get(index)
    }

    fn leaves<'s>(&'s self, out: &mut Vec<Leaf<'s, T>>) {
        out.push(Leaf::new(self.ptr(), StridedView::dims(self), self.strides()));
    }

    #[inline]
    fn consume<I: Iterator<Item = T>>(&self, values: &mut I) -> T {
        values
            .next()
            .expect("not enough values for array leaf consumption")
    }
}

impl<T: Copy> Expression<T> for StridedArray<T> {
    #[inline]
    fn dims(&self) -> Option<&[usize]> {
        Some(StridedArray::dims(self))
    }

    #[inline]
    fn eval(&self, index: &[usize]) -> T {
        self.get(index)
    }

    fn leaves<'s>(&'s self, out: &mut Vec<Leaf<'s, T>>) {
        out.push(Leaf::new(self.base_ptr(), StridedArray::dims(self), self.strides()));
    }

    #[inline]
    fn consume<I: Iterator<Item = T>>(&self, values: &mut I) -> T {
        values
            .next()
            .expect("not enough values for array leaf consumption")
    }
}

// ============================================================================
// Scalar broadcast
// ============================================================================

/// A scalar broadcast to every index of whatever shape it is combined with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar<T>(pub T);

impl<T: Copy> Expression<T> for Scalar<T> {
    #[inline]
    fn dims(&self) -> Option<&[usize]> {
        None
    }

    #[inline]
    fn eval(&self, _index: &[usize]) -> T {
        self.0
    }

    #[inline]
    fn leaves<'s>(&'s self, _out: &mut Vec<Leaf<'s, T>>) {}

    #[inline]
    fn consume<I: Iterator<Item = T>>(&self, _values: &mut I) -> T {
        self.0
    }
}

// ============================================================================
// Binary operation node
// ============================================================================

/// `Op::apply(left[idx], right[idx])` at every index.
#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<Op, L, R> {
    op: Op,
    left: L,
    right: R,
}

impl<Op, L, R> BinaryExpr<Op, L, R> {
    /// Combine two expressions.
    ///
    /// Fails when both operands are shaped and their shapes differ; a scalar
    /// operand adopts the shape of the other side.
    pub fn new<T>(op: Op, left: L, right: R) -> Result<Self>
    where
        T: Copy,
        Op: BinaryOp<T>,
        L: Expression<T>,
        R: Expression<T>,
    {
        if let (Some(l), Some(r)) = (left.dims(), right.dims()) {
            ensure_same_shape(l, r)?;
        }
        Ok(Self { op, left, right })
    }

    /// Node with at least one side known to be a broadcast scalar.
    fn broadcast(op: Op, left: L, right: R) -> Self {
        Self { op, left, right }
    }

    pub fn op(&self) -> Op
    where
        Op: Copy,
    {
        self.op
    }

    pub fn left(&self) -> &L {
        &self.left
    }

    pub fn right(&self) -> &R {
        &self.right
    }
}

impl<T, Op, L, R> Expression<T> for BinaryExpr<Op, L, R>
where
    T: Copy,
    Op: BinaryOp<T>,
    L: Expression<T>,
    R: Expression<T>,
{
    #[inline]
    fn dims(&self) -> Option<&[usize]> {
        self.left.dims().or_else(|| self.right.dims())
    }

    #[inline]
    fn eval(&self, index: &[usize]) -> T {
        Op::apply(self.left.eval(index), self.right.eval(index))
    }

    fn leaves<'s>(&'s self, out: &mut Vec<Leaf<'s, T>>) {
        self.left.leaves(out);
        self.right.leaves(out);
    }

    #[inline]
    fn consume<I: Iterator<Item = T>>(&self, values: &mut I) -> T {
        let lhs = self.left.consume(values);
        let rhs = self.right.consume(values);
        Op::apply(lhs, rhs)
    }
}

// ============================================================================
// Operator overloads
// ============================================================================

macro_rules! impl_scalar_rhs_ops {
    ($($trait:ident, $method:ident, $tag:ident;)*) => {$(
        impl<'a, T: ScalarBase> $trait<T> for &'a StridedArray<T> {
            type Output = BinaryExpr<$tag, StridedView<'a, T>, Scalar<T>>;

            #[inline]
            fn $method(self, rhs: T) -> Self::Output {
                BinaryExpr::broadcast($tag, self.view(), Scalar(rhs))
            }
        }

        impl<T: ScalarBase, Op, L, R> $trait<T> for BinaryExpr<Op, L, R>
        where
            Self: Expression<T>,
        {
            type Output = BinaryExpr<$tag, Self, Scalar<T>>;

            #[inline]
            fn $method(self, rhs: T) -> Self::Output {
                BinaryExpr::broadcast($tag, self, Scalar(rhs))
            }
        }
    )*};
}

impl_scalar_rhs_ops! {
    Add, add, Plus;
    Sub, sub, Minus;
    Mul, mul, Multiplies;
    Div, div, Divides;
}

macro_rules! impl_scalar_lhs_ops {
    ($($scalar:ty),*) => {$(
        impl_scalar_lhs_ops!(@op $scalar, Add, add, Plus);
        impl_scalar_lhs_ops!(@op $scalar, Sub, sub, Minus);
        impl_scalar_lhs_ops!(@op $scalar, Mul, mul, Multiplies);
        impl_scalar_lhs_ops!(@op $scalar, Div, div, Divides);
    )*};
    (@op $scalar:ty, $trait:ident, $method:ident, $tag:ident) => {
        impl<'a> $trait<&'a StridedArray<$scalar>> for $scalar {
            type Output = BinaryExpr<$tag, Scalar<$scalar>, StridedView<'a, $scalar>>;

            #[inline]
            fn $method(self, rhs: &'a StridedArray<$scalar>) -> Self::Output {
                BinaryExpr::broadcast($tag, Scalar(self), rhs.view())
            }
        }

        impl<Op, L, R> $trait<BinaryExpr<Op, L, R>> for $scalar
        where
            BinaryExpr<Op, L, R>: Expression<$scalar>,
        {
            type Output = BinaryExpr<$tag, Scalar<$scalar>, BinaryExpr<Op, L, R>>;

            #[inline]
            fn $method(self, rhs: BinaryExpr<Op, L, R>) -> Self::Output {
                BinaryExpr::broadcast($tag, Scalar(self), rhs)
            }
        }
    };
}

impl_scalar_lhs_ops!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StridedError;

    fn sample() -> StridedArray<i32> {
        // [[1, 2, 3], [4, 5, 6]]
        StridedArray::from_fn_row_major(&[2, 3], |idx| (idx[0] * 3 + idx[1] + 1) as i32)
    }

    #[test]
    fn test_scalar_has_no_shape() {
        let s = Scalar(7);
        assert_eq!(Expression::<i32>::dims(&s), None);
        assert_eq!(s.eval(&[]), 7);
        assert_eq!(s.eval(&[4, 2, 9]), 7);
    }

    #[test]
    fn test_array_op_scalar() {
        let a = sample();
        assert_eq!((&a + 2).eval(&[1, 2]), 8);
        assert_eq!((&a - 2).eval(&[0, 0]), -1);
        assert_eq!((&a * 2).eval(&[1, 0]), 8);
        assert_eq!((&a / 2).eval(&[1, 1]), 2);
    }

    #[test]
    fn test_scalar_op_array_keeps_operand_order() {
        let a = sample();
        assert_eq!((10 - &a).eval(&[0, 1]), 8);
        assert_eq!((12 / &a).eval(&[1, 2]), 2);
        assert_eq!((1 + (&a * 2)).eval(&[1, 2]), 13);
    }

    #[test]
    fn test_nested_expression_shape() {
        let a = sample();
        let e = (&a * 2 + 1) / 3;
        assert_eq!(e.dims(), Some(&[2usize, 3][..]));
        assert_eq!(e.eval(&[1, 2]), 4);
    }

    #[test]
    fn test_eval_is_idempotent() {
        let a = sample();
        let e = &a * 3 - 1;
        let first: Vec<i32> = (0..3).map(|j| e.eval(&[1, j])).collect();
        let second: Vec<i32> = (0..3).map(|j| e.eval(&[1, j])).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![11, 14, 17]);
    }

    #[test]
    fn test_binary_new_checks_shapes() {
        let a = sample();
        let b = StridedArray::<i32>::row_major(&[3, 2]);
        let err = BinaryExpr::new(Plus, a.view(), b.view()).unwrap_err();
        assert_eq!(err, StridedError::ShapeMismatch(vec![2, 3], vec![3, 2]));

        let ok = BinaryExpr::new(Minus, a.view(), Scalar(1)).unwrap();
        assert_eq!(ok.eval(&[0, 0]), 0);
    }

    #[test]
    fn test_binary_new_two_arrays() {
        let a = sample();
        let b = StridedArray::from_fn_col_major(&[2, 3], |idx| (idx[1] * 10) as i32);
        let e = BinaryExpr::new(Plus, &a, &b).unwrap();
        assert_eq!(e.eval(&[1, 2]), 26);
    }

    #[test]
    fn test_leaves_and_consume_agree() {
        let a = sample();
        let b = StridedArray::from_fn_col_major(&[2, 3], |idx| (idx[0] + idx[1]) as i32);
        let e = BinaryExpr::new(Minus, &a * 2, b.view()).unwrap();

        let mut leaves = Vec::new();
        e.leaves(&mut leaves);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].strides, &[3, 1]);
        assert_eq!(leaves[1].strides, &[1, 2]);
        assert!(leaves.iter().all(|leaf| leaf.dims() == [2, 3]));

        // Values in leaf order: a[idx], b[idx].
        let value = e.consume(&mut [6, 3].into_iter());
        assert_eq!(value, 9);
        assert_eq!(e.eval(&[1, 2]), 9);
    }

    #[test]
    fn test_float_division_by_zero_follows_element_type() {
        let a = StridedArray::from_fn_row_major(&[2], |idx| idx[0] as f64);
        let e = &a / 0.0;
        assert!(e.eval(&[0]).is_nan());
        assert!(e.eval(&[1]).is_infinite());
    }
}
