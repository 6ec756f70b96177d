use serde::{Deserialize, Serialize};

/// A query embedding. Produced once per request and never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// Vector values as returned by the service.
    pub vector: Vec<f32>,
    /// Model that produced the vector.
    pub model: String,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        Self {
            vector,
            model: model.into(),
        }
    }

    /// Dimension of [`vector`](Self::vector).
    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.vector
    }
}
