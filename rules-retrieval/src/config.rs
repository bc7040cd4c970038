//! Retrieval tuning knobs.

use crate::errors::RetrievalError;

/// Explicit retrieval configuration, passed to the retriever at construction.
///
/// `similarity_threshold` is expressed on a 0..=1 scale and compared against
/// raw L2 distance after multiplying by `distance_scale`. The scale is a
/// model-dependent tunable: unnormalized embedding spaces produce distances
/// well above 1.0, so the default maps a 0.5 threshold to a distance cutoff
/// of 5.0.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Default number of chunks to return.
    pub top_k: usize,
    /// Hard ceiling on `k`, including caller-supplied overrides.
    pub max_k: usize,
    /// Relevance threshold on a 0..=1 scale.
    pub similarity_threshold: f32,
    /// Multiplier mapping the threshold into raw L2 distance space.
    pub distance_scale: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_k: 8,
            similarity_threshold: 0.5,
            distance_scale: 10.0,
        }
    }
}

impl RetrievalConfig {
    /// Checks the config for unusable values.
    ///
    /// A `top_k` above `max_k` is not an error; the retriever clamps it at
    /// construction.
    ///
    /// # Errors
    /// [`RetrievalError::Config`] when `top_k` or `max_k` is zero, or the
    /// threshold/scale are not positive finite numbers.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.top_k == 0 {
            return Err(RetrievalError::Config("top_k must be at least 1"));
        }
        if self.max_k == 0 {
            return Err(RetrievalError::Config("max_k must be at least 1"));
        }
        if !self.similarity_threshold.is_finite() || self.similarity_threshold <= 0.0 {
            return Err(RetrievalError::Config(
                "similarity_threshold must be positive and finite",
            ));
        }
        if !self.distance_scale.is_finite() || self.distance_scale <= 0.0 {
            return Err(RetrievalError::Config(
                "distance_scale must be positive and finite",
            ));
        }
        Ok(())
    }

    /// Maximum raw L2 distance a hit may have and still count as relevant.
    pub fn distance_cutoff(&self) -> f32 {
        self.similarity_threshold * self.distance_scale
    }
}
