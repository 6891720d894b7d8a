// SIMD implementation of squared Euclidean distance
// Uses wide crate for AVX2/NEON vectorization

use wide::f32x8;

pub fn squared_euclidean_simd(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same length");

    let mut sum_sq = f32x8::splat(0.0);

    let mut chunks_a = a.chunks_exact(8);
    let mut chunks_b = b.chunks_exact(8);

    for (ca, cb) in chunks_a.by_ref().zip(chunks_b.by_ref()) {
        let va = f32x8::new([ca[0], ca[1], ca[2], ca[3], ca[4], ca[5], ca[6], ca[7]]);
        let vb = f32x8::new([cb[0], cb[1], cb[2], cb[3], cb[4], cb[5], cb[6], cb[7]]);

        let diff = va - vb;
        sum_sq += diff * diff;
    }

    let mut result: f32 = sum_sq.to_array().iter().sum();

    // Handle remainder
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        let diff = x - y;
        result += diff * diff;
    }

    result
}
