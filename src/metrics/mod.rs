// Distance kernel. The engine ranks neighbors by squared Euclidean
// distance everywhere: the square root is order-preserving, so it is never
// taken, and every distance reported to callers is the squared value.

mod euclidean;

pub use euclidean::squared_euclidean_scalar;
pub use euclidean::simd::squared_euclidean_simd;

use crate::config::ExecutionMode;

/// Squared Euclidean distance between two vectors of equal length.
///
/// Dispatches to the 8-lane SIMD path when the mode allows it and the
/// dimension is wide enough to pay for it; the scalar path handles any
/// dimension, including those that are not a multiple of the SIMD width.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32], mode: ExecutionMode) -> f32 {
    if a.len() >= 8 && mode.use_simd() {
        squared_euclidean_simd(a, b)
    } else {
        squared_euclidean_scalar(a, b)
    }
}
