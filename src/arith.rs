//! Placeholder arithmetic. Replace with your own implementation.

use std::ops::{Add, Mul};

/// Sum of `a` and `b`. Overflow behaves like the underlying `+`.
pub fn add<T: Add<Output = T>>(a: T, b: T) -> T {
    a + b
}

/// Product of `a` and `b`. Overflow behaves like the underlying `*`.
pub fn multiply<T: Mul<Output = T>>(a: T, b: T) -> T {
    a * b
}
