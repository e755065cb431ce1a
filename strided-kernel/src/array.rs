//! Owned strided multidimensional array.

use std::fmt;
use std::ops::{AddAssign, DivAssign, Index, IndexMut, MulAssign, SubAssign};

use strided_traits::{BinaryOp, Divides, Minus, Multiplies, Plus, ScalarBase};
use strided_view::{Layout, MemoryOrder, StridedView, StridedViewMut};

use crate::assign::{checked_leaves, combine_into, drive};
use crate::expr::{Expression, Scalar};
use crate::Result;

/// Call `f` with every logical index of `dims`, last axis fastest.
///
/// Stops early and returns `false` as soon as `f` does. Empty shapes yield no
/// index; rank 0 yields the single empty index.
pub(crate) fn try_for_each_index(dims: &[usize], mut f: impl FnMut(&[usize]) -> bool) -> bool {
    if dims.iter().any(|&d| d == 0) {
        return true;
    }
    let rank = dims.len();
    let mut idx = vec![0usize; rank];
    loop {
        if !f(&idx) {
            return false;
        }
        let mut level = rank;
        loop {
            if level == 0 {
                return true;
            }
            level -= 1;
            idx[level] += 1;
            if idx[level] < dims[level] {
                break;
            }
            idx[level] = 0;
        }
    }
}

/// Owned strided multidimensional array.
///
/// The buffer holds exactly the slots the layout can address; padding slots
/// introduced by sparse strides are part of the buffer but never part of the
/// logical array.
pub struct StridedArray<T> {
    data: Vec<T>,
    layout: Layout,
}

impl<T: fmt::Debug> fmt::Debug for StridedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedArray")
            .field("dims", &self.layout.dims())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .field("data", &self.data)
            .finish()
    }
}

impl<T: Clone> Clone for StridedArray<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl<T: Clone> StridedArray<T> {
    /// Allocate an array with caller-chosen strides, every slot set to `fill`.
    ///
    /// The buffer length is [`Layout::required_len`]. Fails with
    /// [`StridedError::StrideLengthMismatch`](crate::StridedError::StrideLengthMismatch)
    /// when `dims` and `strides` differ in length.
    pub fn new(dims: &[usize], strides: &[isize], fill: T) -> Result<Self> {
        let layout = Layout::new(dims, strides).map_err(|err| {
            tracing::debug!(?dims, ?strides, %err, "rejected strided array layout");
            err
        })?;
        Ok(Self::from_elem(layout, fill))
    }

    /// Allocate an array for `layout`, every slot set to `fill`.
    ///
    /// The buffer holds [`Layout::required_len`] slots, which every layout
    /// constructor guarantees to cover all logical indices.
    pub fn from_elem(layout: Layout, fill: T) -> Self {
        let data = vec![fill; layout.required_len()];
        Self { data, layout }
    }
}

impl<T: Clone + Default> StridedArray<T> {
    /// Create a column-major array filled with default values.
    pub fn col_major(dims: &[usize]) -> Self {
        Self::from_elem(Layout::col_major(dims), T::default())
    }

    /// Create a row-major array filled with default values.
    pub fn row_major(dims: &[usize]) -> Self {
        Self::from_elem(Layout::row_major(dims), T::default())
    }

    /// Create an array for `layout` with values produced by a function.
    ///
    /// `f` is called once per logical index, in row-major index order
    /// regardless of the layout. Padding slots keep `T::default()`.
    pub fn from_fn(layout: Layout, mut f: impl FnMut(&[usize]) -> T) -> Self {
        let mut array = Self::from_elem(layout, T::default());
        let Self { data, layout } = &mut array;
        try_for_each_index(layout.dims(), |idx| {
            data[layout.offset_of(idx) as usize] = f(idx);
            true
        });
        array
    }

    /// Row-major array with values produced by a function.
    pub fn from_fn_row_major(dims: &[usize], f: impl FnMut(&[usize]) -> T) -> Self {
        Self::from_fn(Layout::row_major(dims), f)
    }

    /// Column-major array with values produced by a function.
    pub fn from_fn_col_major(dims: &[usize], f: impl FnMut(&[usize]) -> T) -> Self {
        Self::from_fn(Layout::col_major(dims), f)
    }
}

impl<T> StridedArray<T> {
    /// Create from raw parts.
    ///
    /// Fails when some logical index would land outside `data`.
    pub fn from_parts(data: Vec<T>, dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        let layout = Layout::from_parts(dims, strides, offset)?;
        if let Err(err) = layout.validate_bounds(data.len()) {
            tracing::debug!(?dims, ?strides, offset, len = data.len(), %err, "rejected raw parts");
            return Err(err);
        }
        Ok(Self { data, layout })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.layout.offset()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Number of logical elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// The backing buffer, padding slots included.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Pointer to the element at logical index zero.
    #[inline]
    pub(crate) fn base_ptr(&self) -> *const T {
        self.data.as_ptr().wrapping_offset(self.layout.offset())
    }

    /// Create an immutable view over this array.
    pub fn view(&self) -> StridedView<'_, T> {
        // SAFETY: the buffer always covers every offset of the layout.
        unsafe { StridedView::new_unchecked(&self.data, self.layout.clone()) }
    }

    /// Create a mutable view over this array.
    pub fn view_mut(&mut self) -> StridedViewMut<'_, T> {
        // SAFETY: the buffer always covers every offset of the layout.
        unsafe { StridedViewMut::new_unchecked(&mut self.data, self.layout.clone()) }
    }

    /// Iterate over the buffer in memory order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Mutable iteration over the buffer in memory order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }
}

impl<T: Copy> StridedArray<T> {
    /// Get an element by multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> T {
        self.data[self.layout.offset_of(indices) as usize]
    }

    /// Set an element by multi-dimensional index.
    pub fn set(&mut self, indices: &[usize], value: T) {
        let idx = self.layout.offset_of(indices) as usize;
        self.data[idx] = value;
    }

    /// `self[idx] = op(self[idx], source[idx])` for every logical index.
    ///
    /// `source` may be a [`Scalar`], another array or view of the same shape,
    /// or any lazy expression over them. Shape and strides of `self` never
    /// change.
    pub fn combine_in_place<Op, E>(&mut self, op: Op, source: E) -> Result<()>
    where
        Op: BinaryOp<T>,
        E: Expression<T>,
    {
        combine_into(&mut self.view_mut(), op, source)
    }

    /// Materialize an expression into a dense array of the given order.
    ///
    /// A shapeless expression (a lone scalar) yields a rank-0 array. Fails if
    /// an array leaf of the expression does not have the expression's shape.
    pub fn from_expr<E: Expression<T>>(expr: E, order: MemoryOrder) -> Result<Self>
    where
        T: ScalarBase,
    {
        let dims = expr.dims().unwrap_or(&[]).to_vec();
        let leaves = checked_leaves(&dims, &expr)?;
        let mut out = Self::from_elem(Layout::with_order(&dims, order), T::zero());
        drive(&mut out.view_mut(), &expr, &leaves, |dst, v| *dst = v);
        Ok(out)
    }

    /// Materialize an expression into a dense array whose axes nest like
    /// those of `like`.
    ///
    /// Fails with a rank mismatch if the expression's rank differs from
    /// `like`'s. A shapeless expression takes `like`'s shape.
    pub fn from_expr_like<E: Expression<T>>(expr: E, like: &Layout) -> Result<Self>
    where
        T: ScalarBase,
    {
        let dims = expr.dims().unwrap_or(like.dims()).to_vec();
        if dims.len() != like.ndim() {
            return Err(crate::StridedError::RankMismatch(dims.len(), like.ndim()));
        }
        let leaves = checked_leaves(&dims, &expr)?;
        let mut out = Self::from_elem(like.dense_like(&dims), T::zero());
        drive(&mut out.view_mut(), &expr, &leaves, |dst, v| *dst = v);
        Ok(out)
    }
}

impl<T: PartialEq> StridedArray<T> {
    /// Compare logical values only, ignoring strides and padding.
    pub fn eq_values(&self, other: &Self) -> bool {
        self.dims() == other.dims()
            && try_for_each_index(self.dims(), |idx| {
                self.data[self.layout.offset_of(idx) as usize]
                    == other.data[other.layout.offset_of(idx) as usize]
            })
    }
}

/// Equal when shapes, strides and every logical element match.
impl<T: PartialEq> PartialEq for StridedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.strides() == other.strides() && self.eq_values(other)
    }
}

impl<T> Index<&[usize]> for StridedArray<T> {
    type Output = T;

    fn index(&self, indices: &[usize]) -> &T {
        &self.data[self.layout.offset_of(indices) as usize]
    }
}

impl<T> IndexMut<&[usize]> for StridedArray<T> {
    fn index_mut(&mut self, indices: &[usize]) -> &mut T {
        let idx = self.layout.offset_of(indices) as usize;
        &mut self.data[idx]
    }
}

macro_rules! impl_compound_assign {
    ($($trait:ident, $method:ident, $tag:ident;)*) => {$(
        impl<T: ScalarBase> $trait<T> for StridedArray<T> {
            #[inline]
            fn $method(&mut self, rhs: T) {
                // A scalar has no array leaves to check.
                drive(&mut self.view_mut(), &Scalar(rhs), &[], |dst, v| {
                    *dst = <$tag as BinaryOp<T>>::apply(*dst, v)
                });
            }
        }
    )*};
}

impl_compound_assign! {
    AddAssign, add_assign, Plus;
    SubAssign, sub_assign, Minus;
    MulAssign, mul_assign, Multiplies;
    DivAssign, div_assign, Divides;
}
