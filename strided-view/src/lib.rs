//! Layout descriptors and borrowed strided views.
//!
//! This crate owns the strided data model: how a logical multi-index maps to
//! a linear offset into a flat buffer. It never performs arithmetic on
//! elements; that lives in `strided-kernel`.
//!
//! # Core Types
//!
//! - [`Layout`]: shape + strides + base offset, with the offset function
//! - [`MemoryOrder`]: the two canonical contiguous layout families
//! - [`StridedView`] / [`StridedViewMut`]: dynamic-rank views over borrowed data
//!
//! # Layout families
//!
//! All of these describe the same logical `[3, 2, 4]` shape:
//!
//! ```rust
//! use strided_view::{Layout, MemoryOrder};
//!
//! let row = Layout::row_major(&[3, 2, 4]);
//! assert_eq!(row.strides(), &[8, 4, 1]);
//!
//! let col = Layout::with_order(&[3, 2, 4], MemoryOrder::ColMajor);
//! assert_eq!(col.strides(), &[1, 3, 6]);
//!
//! // Axis 0 slowest, then axis 2, axis 1 fastest.
//! let central = Layout::permuted(&[3, 2, 4], &[0, 2, 1]).unwrap();
//! assert_eq!(central.strides(), &[8, 1, 2]);
//!
//! // Arbitrary caller strides, including padding.
//! let padded = Layout::new(&[3, 2, 4], &[10, 5, 1]).unwrap();
//! assert_eq!(padded.required_len(), 29);
//! assert_eq!(padded.offset_of(&[2, 1, 3]), 28);
//! ```

pub mod auxiliary;
pub mod layout;
pub mod view;

// ============================================================================
// Layout descriptor
// ============================================================================
pub use layout::{col_major_strides, permuted_strides, row_major_strides, Layout, MemoryOrder};

// ============================================================================
// View-based types
// ============================================================================
pub use view::{StridedView, StridedViewMut};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during strided array operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StridedError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Array shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch: {dims} dims vs {strides} strides")]
    StrideLengthMismatch { dims: usize, strides: usize },

    /// Integer overflow while computing array offset.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// The backing buffer does not cover every addressable offset.
    #[error("buffer too small: layout requires {required} elements, got {len}")]
    BufferTooSmall { required: usize, len: usize },
}

/// Result type for strided array operations.
pub type Result<T> = std::result::Result<T, StridedError>;
