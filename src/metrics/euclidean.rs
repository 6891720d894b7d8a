pub mod simd;

/// Squared (L2) distance: d² = Σ(aᵢ - bᵢ)²
///
/// The sqrt is skipped on purpose: if a² < b², then a < b, so squared
/// distances rank neighbors identically.
pub fn squared_euclidean_scalar(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same length");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
