//! Shared fixtures: one logical `(3, 2, 4)` array stored in four layouts,
//! with floating-point and integer contents.
#![allow(dead_code)]

use strided_kernel::{Layout, StridedArray};

pub const DIMS: [usize; 3] = [3, 2, 4];

/// Right-hand scalar used throughout.
pub const B: f64 = 2.0;

/// Integer right-hand scalar.
pub const B_INT: i32 = 2;

pub struct LayoutFixture {
    pub name: &'static str,
    pub strides: [isize; 3],
}

pub const ROW_MAJOR: LayoutFixture = LayoutFixture {
    name: "row_major",
    strides: [8, 4, 1],
};

pub const COL_MAJOR: LayoutFixture = LayoutFixture {
    name: "col_major",
    strides: [1, 3, 6],
};

/// Axis 0 slowest, then axis 2, axis 1 fastest.
pub const CENTRAL: LayoutFixture = LayoutFixture {
    name: "central",
    strides: [8, 1, 2],
};

/// Axis 1 slowest, then axis 0, axis 2 fastest.
pub const UNIT: LayoutFixture = LayoutFixture {
    name: "unit",
    strides: [4, 12, 1],
};

pub const FIXTURES: [LayoutFixture; 4] = [ROW_MAJOR, COL_MAJOR, CENTRAL, UNIT];

/// Logical content of every fixture: distinct, exactly representable values.
pub fn value_at(idx: &[usize]) -> f64 {
    (1 + idx[0] * 8 + idx[1] * 4 + idx[2]) as f64 * 0.5
}

/// Integer content: odd and even, negative and positive, so division
/// truncates toward zero on both sides.
pub fn int_value_at(idx: &[usize]) -> i32 {
    (1 + idx[0] * 8 + idx[1] * 4 + idx[2]) as i32 - 12
}

pub fn build<T: Clone + Default>(strides: &[isize], f: impl FnMut(&[usize]) -> T) -> StridedArray<T> {
    let layout = Layout::new(&DIMS, strides).expect("fixture layout");
    StridedArray::from_fn(layout, f)
}

impl LayoutFixture {
    pub fn array(&self) -> StridedArray<f64> {
        build(&self.strides, value_at)
    }

    /// `op(a[idx], B)` stored in this fixture's layout.
    pub fn expected(&self, op: fn(f64, f64) -> f64) -> StridedArray<f64> {
        build(&self.strides, |idx| op(value_at(idx), B))
    }

    pub fn int_array(&self) -> StridedArray<i32> {
        build(&self.strides, int_value_at)
    }

    /// `op(a[idx], B_INT)` stored in this fixture's layout.
    pub fn int_expected(&self, op: fn(i32, i32) -> i32) -> StridedArray<i32> {
        build(&self.strides, |idx| op(int_value_at(idx), B_INT))
    }
}

pub const OPS: [(&str, fn(f64, f64) -> f64); 4] = [
    ("+", |x, y| x + y),
    ("-", |x, y| x - y),
    ("*", |x, y| x * y),
    ("/", |x, y| x / y),
];

pub const INT_OPS: [(&str, fn(i32, i32) -> i32); 4] = [
    ("+", |x, y| x + y),
    ("-", |x, y| x - y),
    ("*", |x, y| x * y),
    ("/", |x, y| x / y),
];
