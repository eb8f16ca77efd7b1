/// Cosine similarity; 0.0 when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0f32, 0f32, 0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Score used across stores: cosine similarity shifted into `[0, 2]`.
pub fn shifted_cosine(a: &[f32], b: &[f32]) -> f32 { cosine_similarity(a, b) + 1.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_opposite_and_orthogonal() {
        assert!((shifted_cosine(&[1.0, 0.0], &[2.0, 0.0]) - 2.0).abs() < 1e-6);
        assert!(shifted_cosine(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
        assert!((shifted_cosine(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
