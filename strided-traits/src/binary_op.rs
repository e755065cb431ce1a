//! Element-wise binary operations used by lazy expressions and compound
//! assignment.
//!
//! Each operation is a zero-sized tag type. The evaluation routines of the
//! kernel are parameterized by the tag, so the operation is resolved at
//! compile time instead of through a vtable:
//!
//! | tag          | `apply(a, b)` |
//! |--------------|---------------|
//! | [`Plus`]       | `a + b`       |
//! | [`Minus`]      | `a - b`       |
//! | [`Multiplies`] | `a * b`       |
//! | [`Divides`]    | `a / b`       |
//!
//! Numeric faults (integer overflow, division by zero) are whatever `T`
//! defines them to be; the tags add no checks of their own.

use std::ops::{Add, Div, Mul, Sub};

/// Addition: f(a, b) = a + b
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Plus;

/// Subtraction: f(a, b) = a - b
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Minus;

/// Multiplication: f(a, b) = a * b
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Multiplies;

/// Division: f(a, b) = a / b
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Divides;

/// A stateless binary operation on elements of type `T`.
///
/// Implementors are expected to be pure: applying the same operation to the
/// same operands must always give the same result.
pub trait BinaryOp<T>: Copy + Default + 'static {
    /// Operator symbol, used in diagnostics.
    const SYMBOL: &'static str;

    /// Apply the operation to a pair of values.
    fn apply(lhs: T, rhs: T) -> T;
}

impl<T: Add<Output = T>> BinaryOp<T> for Plus {
    const SYMBOL: &'static str = "+";

    #[inline(always)]
    fn apply(lhs: T, rhs: T) -> T {
        lhs + rhs
    }
}

impl<T: Sub<Output = T>> BinaryOp<T> for Minus {
    const SYMBOL: &'static str = "-";

    #[inline(always)]
    fn apply(lhs: T, rhs: T) -> T {
        lhs - rhs
    }
}

impl<T: Mul<Output = T>> BinaryOp<T> for Multiplies {
    const SYMBOL: &'static str = "*";

    #[inline(always)]
    fn apply(lhs: T, rhs: T) -> T {
        lhs * rhs
    }
}

impl<T: Div<Output = T>> BinaryOp<T> for Divides {
    const SYMBOL: &'static str = "/";

    #[inline(always)]
    fn apply(lhs: T, rhs: T) -> T {
        lhs / rhs
    }
}
