//! Layout descriptor: how a logical multi-index maps to a buffer offset.
//!
//! A [`Layout`] is a shape (`dims`), one stride per axis and a base offset.
//! The element at logical index `(i0, .., ik)` lives at
//! `offset + Σ ij * strides[j]`. Strides are independent of the shape, so the
//! same logical array can be laid out row-major, column-major, as any axis
//! permutation, padded, or with zero strides on broadcast axes.

use std::sync::Arc;

use crate::auxiliary::axis_order;
use crate::{Result, StridedError};

/// The two canonical contiguous layout families.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum MemoryOrder {
    /// C-like layout: last axis varies fastest.
    #[default]
    RowMajor,
    /// Fortran-like layout: first axis varies fastest.
    ColMajor,
}

/// Dense strides for axes nested as in `perm` (slowest first).
///
/// `None` when the element count does not fit in `isize`.
fn nested_strides(dims: &[usize], perm: impl DoubleEndedIterator<Item = usize>) -> Option<Vec<isize>> {
    let mut strides = vec![0isize; dims.len()];
    let mut stride = 1isize;
    for axis in perm.rev() {
        strides[axis] = stride;
        stride = isize::try_from(dims[axis]).ok().and_then(|d| stride.checked_mul(d))?;
    }
    Some(strides)
}

fn stride_overflow(dims: &[usize]) -> ! {
    panic!("element count of dims {dims:?} overflows isize")
}

/// Compute column-major strides (first index varies fastest).
///
/// Panics if the element count overflows `isize`.
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    nested_strides(dims, (0..dims.len()).rev()).unwrap_or_else(|| stride_overflow(dims))
}

/// Compute row-major strides (last index varies fastest).
///
/// Panics if the element count overflows `isize`.
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    nested_strides(dims, 0..dims.len()).unwrap_or_else(|| stride_overflow(dims))
}

/// Compute dense strides for an arbitrary axis nesting.
///
/// `perm[0]` is the slowest varying axis and `perm[rank - 1]` the fastest, so
/// the identity permutation gives row-major strides and the reversed one
/// column-major strides. Fails with [`StridedError::OffsetOverflow`] when the
/// element count does not fit in `isize`.
pub fn permuted_strides(dims: &[usize], perm: &[usize]) -> Result<Vec<isize>> {
    check_permutation(perm, dims.len())?;
    nested_strides(dims, perm.iter().copied()).ok_or(StridedError::OffsetOverflow)
}

fn check_permutation(perm: &[usize], rank: usize) -> Result<()> {
    if perm.len() != rank {
        return Err(StridedError::RankMismatch(perm.len(), rank));
    }
    let mut seen = vec![false; rank];
    for &p in perm {
        if p >= rank || seen[p] {
            return Err(StridedError::InvalidAxis { axis: p, rank });
        }
        seen[p] = true;
    }
    Ok(())
}

/// Lowest and highest offsets addressed by a non-empty layout.
fn offset_span(dims: &[usize], strides: &[isize], offset: isize) -> Result<(isize, isize)> {
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(StridedError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(StridedError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(StridedError::OffsetOverflow)?;
            }
        }
    }
    Ok((min_offset, max_offset))
}

/// Shape, strides and base offset of a strided array.
///
/// Every constructor guarantees that the logical indices of a non-empty
/// layout resolve to offsets in `[0, required_len())`, so a buffer of
/// [`Layout::required_len`] elements always covers the layout.
///
/// Two layouts compare equal when shape, strides and base offset all match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl Layout {
    /// Layout with caller-supplied strides.
    ///
    /// Zero, repeated and negative strides are all accepted. The base offset
    /// is chosen so that the lowest addressed element sits at buffer index 0.
    pub fn new(dims: &[usize], strides: &[isize]) -> Result<Self> {
        if dims.len() != strides.len() {
            return Err(StridedError::StrideLengthMismatch {
                dims: dims.len(),
                strides: strides.len(),
            });
        }
        let offset = if dims.iter().any(|&d| d == 0) {
            0
        } else {
            let (min_offset, _) = offset_span(dims, strides, 0)?;
            min_offset.checked_neg().ok_or(StridedError::OffsetOverflow)?
        };
        // Rejects layouts whose highest offset does not fit in isize.
        offset_span(dims, strides, offset)?;
        Ok(Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    /// Layout with an explicit base offset.
    ///
    /// Unlike [`Layout::new`], negative strides are not compensated: fails
    /// with [`StridedError::OffsetOverflow`] if some logical index of a
    /// non-empty shape would resolve to a negative offset.
    pub fn from_parts(dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        if dims.len() != strides.len() {
            return Err(StridedError::StrideLengthMismatch {
                dims: dims.len(),
                strides: strides.len(),
            });
        }
        if !dims.iter().any(|&d| d == 0) {
            let (min_offset, _) = offset_span(dims, strides, offset)?;
            if min_offset < 0 {
                return Err(StridedError::OffsetOverflow);
            }
        }
        Ok(Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    /// Dense row-major layout.
    pub fn row_major(dims: &[usize]) -> Self {
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(row_major_strides(dims)),
            offset: 0,
        }
    }

    /// Dense column-major layout.
    pub fn col_major(dims: &[usize]) -> Self {
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(col_major_strides(dims)),
            offset: 0,
        }
    }

    /// Dense layout of the given family.
    pub fn with_order(dims: &[usize], order: MemoryOrder) -> Self {
        match order {
            MemoryOrder::RowMajor => Self::row_major(dims),
            MemoryOrder::ColMajor => Self::col_major(dims),
        }
    }

    /// Dense layout with an arbitrary axis nesting, see [`permuted_strides`].
    pub fn permuted(dims: &[usize], perm: &[usize]) -> Result<Self> {
        let strides = permuted_strides(dims, perm)?;
        Ok(Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: 0,
        })
    }

    /// Dense layout of `dims` whose axes nest like those of `self`.
    ///
    /// Used to give a freshly materialized result the memory order of its
    /// source. Panics if `dims` has a different rank than `self` or its
    /// element count overflows `isize`.
    pub fn dense_like(&self, dims: &[usize]) -> Self {
        assert_eq!(dims.len(), self.ndim(), "rank mismatch in dense_like");
        let perm = axis_order(&self.strides);
        let strides =
            nested_strides(dims, perm.into_iter()).unwrap_or_else(|| stride_overflow(dims));
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: 0,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of logical elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// Buffer offset of a logical multi-index.
    ///
    /// Panics if `index` has the wrong rank or is out of bounds.
    #[inline]
    pub fn offset_of(&self, index: &[usize]) -> isize {
        assert_eq!(index.len(), self.dims.len(), "wrong number of indices");
        let mut idx = self.offset;
        for (i, &index) in index.iter().enumerate() {
            assert!(
                index < self.dims[i],
                "index {} out of bounds for dim {}",
                index,
                self.dims[i]
            );
            idx += index as isize * self.strides[i];
        }
        idx
    }

    /// Buffer offset of a logical multi-index, without checks.
    #[inline]
    pub fn offset_of_unchecked(&self, index: &[usize]) -> isize {
        let mut idx = self.offset;
        for (&index, &stride) in index.iter().zip(self.strides.iter()) {
            idx += index as isize * stride;
        }
        idx
    }

    /// Smallest buffer length that keeps every logical index in bounds.
    ///
    /// Zero for empty shapes, otherwise `1 + highest addressed offset`.
    pub fn required_len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        match offset_span(&self.dims, &self.strides, self.offset) {
            Ok((_, max_offset)) if max_offset >= 0 => max_offset as usize + 1,
            _ => usize::MAX,
        }
    }

    /// Check that every logical index resolves to an offset in `[0, len)`.
    pub fn validate_bounds(&self, len: usize) -> Result<()> {
        // Empty array - no access needed
        if self.is_empty() {
            return Ok(());
        }
        let (min_offset, max_offset) = offset_span(&self.dims, &self.strides, self.offset)?;
        if min_offset < 0 || max_offset < 0 {
            return Err(StridedError::OffsetOverflow);
        }
        if max_offset as usize >= len {
            return Err(StridedError::BufferTooSmall {
                required: max_offset as usize + 1,
                len,
            });
        }
        Ok(())
    }

    /// The canonical family this layout belongs to, if it is contiguous.
    ///
    /// Axes with `dim <= 1` are ignored since they do not affect
    /// addressability. Negative strides never count as contiguous.
    pub fn memory_order(&self) -> Option<MemoryOrder> {
        contiguous_order(&self.dims, &self.strides)
    }

    /// Whether the layout addresses each slot of a `required_len()` buffer
    /// exactly once, for any axis nesting.
    pub fn is_dense(&self) -> bool {
        let mut axes: Vec<(usize, usize)> = self
            .dims
            .iter()
            .zip(self.strides.iter())
            .filter(|(&d, _)| d > 1)
            .map(|(&d, &s)| (s.unsigned_abs(), d))
            .collect();
        axes.sort_unstable();
        let mut expected = 1usize;
        for (stride, dim) in axes {
            if stride != expected {
                return false;
            }
            expected = expected.saturating_mul(dim);
        }
        true
    }

    /// Permute axes without touching the data.
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        check_permutation(perm, self.ndim())?;
        let dims: Vec<usize> = perm.iter().map(|&p| self.dims[p]).collect();
        let strides: Vec<isize> = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: self.offset,
        })
    }

    /// Expand size-1 axes to `target_dims` by giving them stride 0.
    pub fn broadcast(&self, target_dims: &[usize]) -> Result<Self> {
        if self.dims.len() != target_dims.len() {
            return Err(StridedError::RankMismatch(
                self.dims.len(),
                target_dims.len(),
            ));
        }
        let mut new_strides = Vec::with_capacity(self.dims.len());
        for i in 0..self.dims.len() {
            if self.dims[i] == target_dims[i] {
                new_strides.push(self.strides[i]);
            } else if self.dims[i] == 1 {
                new_strides.push(0);
            } else {
                return Err(StridedError::ShapeMismatch(
                    self.dims.to_vec(),
                    target_dims.to_vec(),
                ));
            }
        }
        Ok(Self {
            dims: Arc::from(target_dims),
            strides: Arc::from(new_strides),
            offset: self.offset,
        })
    }
}

/// Contiguous family of `(dims, strides)`, ignoring size-1 axes.
pub fn contiguous_order(dims: &[usize], strides: &[isize]) -> Option<MemoryOrder> {
    if dims.len() != strides.len() {
        return None;
    }
    if dims.is_empty() {
        return Some(MemoryOrder::RowMajor);
    }

    // Row-major: check from last to first.
    let mut expected = 1isize;
    let mut row_ok = true;
    for (&dim, &stride) in dims.iter().rev().zip(strides.iter().rev()) {
        if dim <= 1 {
            continue;
        }
        if stride != expected {
            row_ok = false;
            break;
        }
        expected = expected.saturating_mul(dim as isize);
    }
    if row_ok {
        return Some(MemoryOrder::RowMajor);
    }

    // Col-major: check from first to last.
    let mut expected = 1isize;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim <= 1 {
            continue;
        }
        if stride != expected {
            return None;
        }
        expected = expected.saturating_mul(dim as isize);
    }
    Some(MemoryOrder::ColMajor)
}
