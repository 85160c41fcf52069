//! Embedding provider contract and a deterministic hashing embedder.

use crate::error::EmbeddingError;

/// Default dimensionality of [`HashingEmbedder`].
pub const DEFAULT_HASHING_DIMENSIONS: usize = 512;

/// Turns text into a fixed-length vector.
///
/// Implementations must be deterministic for a given text. Vectors are
/// compared with a plain dot product, so providers should return
/// L2-normalized vectors when cosine semantics are wanted.
pub trait EmbeddingProvider {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;
}

/// Feature-hashing embedder: each lower-cased alphanumeric token adds one to
/// a hashed bucket, and the result is L2-normalized.
///
/// Texts sharing words score high; unrelated texts score near zero. No model
/// is involved, which makes it suitable for tests and offline use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder with the given number of buckets (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
            tokens += 1;
        }

        if tokens == 0 {
            return Err(EmbeddingError::EmptyInput);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for v in &mut vector {
            *v /= norm;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// 64-bit FNV-1a. Fixed constants keep bucket assignment identical across
/// builds and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

/// Dot product over the common prefix of two vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_embedder_is_normalized_and_deterministic() {
        let embedder = HashingEmbedder::default();
        let first = embedder.embed("Systems programming language").unwrap();
        let second = embedder.embed("systems PROGRAMMING language").unwrap();

        assert_eq!(first.len(), embedder.dimensions());
        assert_eq!(first, second);
        assert!((dot(&first, &first) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::new(1024);
        let query = embedder.embed("programming language").unwrap();
        let close = embedder.embed("a programming language for systems").unwrap();
        let far = embedder.embed("capital city of France").unwrap();

        assert!(dot(&query, &close) > dot(&query, &far));
        assert!(dot(&query, &close) > 0.5);
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(HashingEmbedder::new(7).bucket("a"), (0xaf63_dc4c_8601_ec8cu64 % 7) as usize);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let embedder = HashingEmbedder::default();
        assert_eq!(embedder.embed("  ...  "), Err(EmbeddingError::EmptyInput));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
