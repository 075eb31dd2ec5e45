//! Conversion helpers that make casts explicit and panic on information loss.

/// Converts a `usize` into an `f64`.
///
/// # Panics
///
/// Panics if the integer cannot be represented exactly.
pub fn f64_from_usize(x: usize) -> f64 {
    let result = x as f64;
    assert!(result as usize == x);
    result
}

/// Converts an `f64` into a `usize`, truncating towards zero.
///
/// # Panics
///
/// Panics if `x` is negative or not finite.
pub fn usize_from_f64(x: f64) -> usize {
    assert!(x.is_finite());
    assert!(x >= 0.0);
    x as usize
}
