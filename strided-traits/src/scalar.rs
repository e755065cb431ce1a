//! Scalar type bounds for strided arithmetic.

use std::ops::{Add, Div, Mul, Sub};

/// Trait bounds shared by every element type the arithmetic engine accepts.
///
/// The four operators back the [`Plus`](crate::Plus), [`Minus`](crate::Minus),
/// [`Multiplies`](crate::Multiplies) and [`Divides`](crate::Divides) tags;
/// `Zero` is the fill value used when a destination has to be allocated
/// before it is assigned. Nothing else about the numeric behavior of `T`
/// (overflow, division by zero) is assumed.
pub trait ScalarBase:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + num_traits::Zero
    + PartialEq
{
}

impl<T> ScalarBase for T where
    T: Copy
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
        + num_traits::Zero
        + PartialEq
{
}
