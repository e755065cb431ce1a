//! Scalar-broadcast arithmetic and assignment for strided arrays.
//!
//! This crate owns [`StridedArray`] and everything that computes with it:
//! lazy `array op scalar` expressions, in-place compound assignment and
//! non-aliasing assignment into a destination of any layout. The heavy
//! lifting is a cache-aware traversal kernel that orders, fuses and blocks
//! dimensions based on the strides of every operand.
//!
//! # Example
//!
//! ```rust
//! use strided_kernel::{noalias, StridedArray};
//!
//! // [[1, 2, 3], [4, 5, 6]], row-major
//! let mut a = StridedArray::<i32>::from_fn_row_major(&[2, 3], |idx| (idx[0] * 3 + idx[1] + 1) as i32);
//! a += 2;
//! assert_eq!(a.get(&[1, 2]), 8);
//! assert_eq!(a.strides(), &[3, 1]);
//!
//! // Column-major destination keeps its strides.
//! let mut dest = StridedArray::<i32>::col_major(&[2, 3]);
//! noalias(&mut dest).assign(&a - 2).unwrap();
//! assert_eq!(dest.strides(), &[1, 2]);
//! assert_eq!(dest.get(&[1, 0]), 4);
//! ```

pub mod array;
pub mod assign;
pub mod expr;

mod block;
mod fuse;
mod kernel;
mod order;

/// Target footprint of one traversal block, in bytes.
pub const BLOCK_MEMORY_SIZE: usize = 1 << 15;

/// Cache line length assumed by the blocking planner, in bytes.
pub const CACHE_LINE_SIZE: usize = 64;

pub use array::StridedArray;
pub use assign::{assign_into, combine_into, materialize, noalias, NoAlias};
pub use expr::{BinaryExpr, Expression, Leaf, Scalar};

pub use strided_traits::{BinaryOp, Divides, Minus, Multiplies, Plus, ScalarBase};
pub use strided_view::{
    col_major_strides, permuted_strides, row_major_strides, Layout, MemoryOrder, Result,
    StridedError, StridedView, StridedViewMut,
};
