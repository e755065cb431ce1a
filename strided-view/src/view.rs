//! Dynamic-rank strided views over borrowed buffers.
//!
//! - [`StridedView`]: immutable view, the read side of every expression leaf
//! - [`StridedViewMut`]: mutable view, the write side of every assignment
//!
//! Both pair a borrowed slice with a [`Layout`]. Construction validates that
//! every logical index resolves inside the slice, so element access only
//! needs the per-index bounds assertion.

use crate::layout::Layout;
use crate::Result;

// ============================================================================
// StridedView
// ============================================================================

/// Dynamic-rank immutable strided view.
///
/// # Type Parameters
/// - `'a`: Lifetime of the underlying data
/// - `T`: Element type
pub struct StridedView<'a, T> {
    data: &'a [T],
    layout: Layout,
}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            layout: self.layout.clone(),
        }
    }
}

impl<T> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("dims", &self.layout.dims())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .finish()
    }
}

impl<'a, T> StridedView<'a, T> {
    /// Create a new immutable strided view from a borrowed slice.
    pub fn new(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        let layout = Layout::from_parts(dims, strides, offset)?;
        Self::from_layout(data, layout)
    }

    /// Create a view from an existing layout.
    pub fn from_layout(data: &'a [T], layout: Layout) -> Result<Self> {
        layout.validate_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    /// Create a view without bounds checking.
    ///
    /// # Safety
    /// The caller must ensure all index combinations stay within bounds.
    pub unsafe fn new_unchecked(data: &'a [T], layout: Layout) -> Self {
        Self { data, layout }
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

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Raw const pointer to the element at the view's base offset.
    #[inline]
    pub fn ptr(&self) -> *const T {
        self.data.as_ptr().wrapping_offset(self.layout.offset())
    }

    /// Permute dimensions.
    pub fn permute(&self, perm: &[usize]) -> Result<StridedView<'a, T>> {
        Ok(StridedView {
            data: self.data,
            layout: self.layout.permute(perm)?,
        })
    }

    /// Broadcast this view to a target shape.
    ///
    /// Size-1 dimensions are expanded (stride set to 0) to match target.
    pub fn broadcast(&self, target_dims: &[usize]) -> Result<StridedView<'a, T>> {
        Ok(StridedView {
            data: self.data,
            layout: self.layout.broadcast(target_dims)?,
        })
    }
}

impl<'a, T: Copy> StridedView<'a, T> {
    /// Get an element by logical index.
    pub fn get(&self, indices: &[usize]) -> T {
        self.data[self.layout.offset_of(indices) as usize]
    }

    /// Get an element without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure indices are within bounds.
    #[inline]
    pub unsafe fn get_unchecked(&self, indices: &[usize]) -> T {
        *self
            .data
            .get_unchecked(self.layout.offset_of_unchecked(indices) as usize)
    }
}

// ============================================================================
// StridedViewMut
// ============================================================================

/// Dynamic-rank mutable strided view.
pub struct StridedViewMut<'a, T> {
    data: &'a mut [T],
    layout: Layout,
}

impl<T> std::fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("dims", &self.layout.dims())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .finish()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Create a new mutable strided view.
    pub fn new(
        data: &'a mut [T],
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        let layout = Layout::from_parts(dims, strides, offset)?;
        Self::from_layout(data, layout)
    }

    /// Create a mutable view from an existing layout.
    pub fn from_layout(data: &'a mut [T], layout: Layout) -> Result<Self> {
        layout.validate_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    /// Create without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure all index combinations stay within bounds.
    pub unsafe fn new_unchecked(data: &'a mut [T], layout: Layout) -> Self {
        Self { data, layout }
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

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Raw const pointer to the element at the view's base offset.
    #[inline]
    pub fn ptr(&self) -> *const T {
        self.data.as_ptr().wrapping_offset(self.layout.offset())
    }

    /// Raw mutable pointer to the element at the view's base offset.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr().wrapping_offset(self.layout.offset())
    }

    /// Permute dimensions, consuming the mutable view.
    pub fn permute(self, perm: &[usize]) -> Result<StridedViewMut<'a, T>> {
        let layout = self.layout.permute(perm)?;
        Ok(StridedViewMut {
            data: self.data,
            layout,
        })
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            data: &*self.data,
            layout: self.layout.clone(),
        }
    }
}

impl<'a, T: Copy> StridedViewMut<'a, T> {
    /// Get an element.
    pub fn get(&self, indices: &[usize]) -> T {
        self.data[self.layout.offset_of(indices) as usize]
    }

    /// Set an element.
    pub fn set(&mut self, indices: &[usize], value: T) {
        let idx = self.layout.offset_of(indices) as usize;
        self.data[idx] = value;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StridedError;
    use num_complex::Complex64;

    #[test]
    fn test_strided_view_new() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = StridedView::<f64>::new(&data, &[2, 3], &[3, 1], 0).unwrap();
        assert_eq!(view.ndim(), 2);
        assert_eq!(view.dims(), &[2, 3]);
        assert_eq!(view.strides(), &[3, 1]);
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn test_strided_view_rejects_short_buffer() {
        let data = vec![0.0f64; 5];
        let err = StridedView::new(&data, &[2, 3], &[3, 1], 0).unwrap_err();
        assert_eq!(err, StridedError::BufferTooSmall { required: 6, len: 5 });
    }

    #[test]
    fn test_strided_view_get() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = StridedView::<f64>::new(&data, &[2, 3], &[3, 1], 0).unwrap();
        assert_eq!(view.get(&[0, 0]), 1.0);
        assert_eq!(view.get(&[0, 2]), 3.0);
        assert_eq!(view.get(&[1, 0]), 4.0);
        assert_eq!(view.get(&[1, 2]), 6.0);
    }

    #[test]
    fn test_strided_view_col_major() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = StridedView::<f64>::new(&data, &[2, 3], &[1, 2], 0).unwrap();
        assert_eq!(view.get(&[0, 0]), 1.0); // data[0]
        assert_eq!(view.get(&[1, 0]), 2.0); // data[1]
        assert_eq!(view.get(&[0, 1]), 3.0); // data[2]
        assert_eq!(view.get(&[1, 2]), 6.0); // data[5]
    }

    #[test]
    fn test_strided_view_negative_stride() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let layout = Layout::new(&[2, 3], &[-3, 1]).unwrap();
        let view = StridedView::from_layout(&data, layout).unwrap();
        assert_eq!(view.get(&[0, 0]), 4);
        assert_eq!(view.get(&[1, 2]), 3);
        assert_eq!(unsafe { *view.ptr() }, 4);
    }

    #[test]
    fn test_strided_view_permute() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let view = StridedView::<f64>::new(&data, &[2, 3], &[3, 1], 0).unwrap();
        let perm = view.permute(&[1, 0]).unwrap();
        assert_eq!(perm.dims(), &[3, 2]);
        assert_eq!(perm.strides(), &[1, 3]);
        assert_eq!(perm.get(&[1, 0]), 2.0);
        assert_eq!(perm.get(&[0, 1]), 4.0);
        assert!(view.permute(&[0, 0]).is_err());
    }

    #[test]
    fn test_strided_view_broadcast() {
        let data = vec![1.0, 2.0, 3.0];
        let view = StridedView::<f64>::new(&data, &[1, 3], &[3, 1], 0).unwrap();
        let broad = view.broadcast(&[4, 3]).unwrap();
        assert_eq!(broad.dims(), &[4, 3]);
        for i in 0..4 {
            assert_eq!(broad.get(&[i, 0]), 1.0);
            assert_eq!(broad.get(&[i, 2]), 3.0);
        }
    }

    #[test]
    fn test_strided_view_complex() {
        let data = vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)];
        let view = StridedView::<Complex64>::new(&data, &[2], &[1], 0).unwrap();
        assert_eq!(view.get(&[1]), Complex64::new(3.0, 4.0));
    }

    #[test]
    fn test_strided_view_mut() {
        let mut data = vec![0.0; 6];
        {
            let mut view = StridedViewMut::<f64>::new(&mut data, &[2, 3], &[1, 2], 0).unwrap();
            view.set(&[1, 0], 1.0);
            view.set(&[0, 2], 6.0);
            assert_eq!(view.get(&[1, 0]), 1.0);
        }
        assert_eq!(data[1], 1.0);
        assert_eq!(data[4], 6.0);
    }

    #[test]
    fn test_strided_view_mut_as_view() {
        let mut data = vec![1.0, 2.0, 3.0];
        let vm = StridedViewMut::<f64>::new(&mut data, &[3], &[1], 0).unwrap();
        let v = vm.as_view();
        assert_eq!(v.get(&[0]), 1.0);
        assert_eq!(v.get(&[2]), 3.0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_strided_view_mut_set_out_of_bounds() {
        let mut data = vec![0; 6];
        let mut vm = StridedViewMut::new(&mut data, &[2, 3], &[3, 1], 0).unwrap();
        vm.set(&[0, 3], 1);
    }
}
