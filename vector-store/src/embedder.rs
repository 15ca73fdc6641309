/// Produces a fixed-dimension, L2-normalized embedding for a chunk of
/// text. The `VectorIndex` exposes this to `FileGraph` (spec.md §4.3,
/// §4.14) so file-level similarity can be computed without re-entering
/// the index.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
    fn dimension(&self) -> usize;
}

/// Deterministic, offline, no-model-file embedder: a hashed bag-of-words
/// projected into a fixed-width vector. Good enough to exercise ranking,
/// filtering and the file graph end to end without a real embedding
/// backend; the default so this crate is fully testable offline.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        normalize(&mut vector);
        vector
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub(crate) fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(feature = "semantic")]
mod onnx {
    use super::Embedder;
    use fastembed::{InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Real local-inference embedder, behind the `semantic` feature.
    /// Loads the model lazily on first use so constructing an
    /// `OnnxEmbedder` never touches disk or network until it is
    /// actually needed (matching the `FileReader`'s lazy converter
    /// init, spec.md §4.4).
    pub struct OnnxEmbedder {
        model: Mutex<Option<TextEmbedding>>,
        dimension: usize,
    }

    impl OnnxEmbedder {
        pub fn new(dimension: usize) -> Self {
            Self {
                model: Mutex::new(None),
                dimension,
            }
        }

        fn ensure_loaded(&self) -> Result<(), String> {
            let mut guard = self.model.lock().unwrap();
            if guard.is_none() {
                let model = TextEmbedding::try_new(InitOptions::default())
                    .map_err(|e| e.to_string())?;
                *guard = Some(model);
            }
            Ok(())
        }
    }

    impl Embedder for OnnxEmbedder {
        fn embed(&self, text: &str) -> Vec<f32> {
            if self.ensure_loaded().is_err() {
                return vec![0.0; self.dimension];
            }
            let mut guard = self.model.lock().unwrap();
            let model = guard.as_mut().expect("loaded above");
            match model.embed(vec![text.to_string()], None) {
                Ok(mut embeddings) if !embeddings.is_empty() => embeddings.remove(0),
                _ => vec![0.0; self.dimension],
            }
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}

#[cfg(feature = "semantic")]
pub use onnx::OnnxEmbedder;
