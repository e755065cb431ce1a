//! Shared traits for the strided-rs ecosystem.
//!
//! This crate provides the operation tags and element bounds that are shared
//! across `strided-view` and `strided-kernel`. External crates can depend on
//! `strided-traits` to implement [`BinaryOp`] for their own tags without
//! orphan rule violations.

pub mod binary_op;
pub mod scalar;

pub use binary_op::{BinaryOp, Divides, Minus, Multiplies, Plus};
pub use scalar::ScalarBase;
