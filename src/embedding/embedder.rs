use std::path::Path;

use ndarray::Axis;

use crate::config::AppConfig;
use crate::embedding::extractor::{FeatureExtractor, OnnxExtractor};
use crate::errors::{EmbedError, EmbedResult};

/// Owns the embedding capability and turns image files into unit-norm
/// feature vectors for the search index.
pub struct Embedder {
    extractor: Box<dyn FeatureExtractor>,
}

impl Embedder {
    /// Wrap an already-initialised embedding capability.
    pub fn new(extractor: Box<dyn FeatureExtractor>) -> Self {
        Self { extractor }
    }

    /// Build an embedder backed by the ONNX model named in `config`.
    pub fn from_config(config: &AppConfig) -> EmbedResult<Self> {
        let extractor = OnnxExtractor::load(&config.model)?;
        Ok(Self::new(Box::new(extractor)))
    }

    /// Decode the image at `image_path`, run it through the embedding
    /// capability and return the L2-normalised feature vector.
    ///
    /// Fails with `Decode` for missing or unreadable images, `Extraction`
    /// when the capability itself fails, and `Normalization` when the raw
    /// vector has zero (or non-finite) norm and cannot be scaled to unit
    /// length.
    pub fn extract_normalized_embedding(
        &mut self,
        image_path: impl AsRef<Path>,
    ) -> EmbedResult<Vec<f32>> {
        let image_path = image_path.as_ref();

        let img = image::open(image_path)
            .map_err(|e| EmbedError::Decode(format!("{}: {e}", image_path.display())))?;

        let features = self.extractor.extract(&img)?;
        if features.shape()[0] == 0 || features.shape()[1] == 0 {
            return Err(EmbedError::Extraction(format!(
                "empty feature tensor: {:?}",
                features.shape()
            )));
        }

        // Capability output is [batch, item, dim] with a single entry;
        // unwrap the nesting here and keep a flat vector from now on.
        let raw = features.index_axis(Axis(0), 0);
        let raw = raw.index_axis(Axis(0), 0).to_vec();

        let norm = l2_norm(&raw);
        if norm == 0.0 || !norm.is_finite() {
            return Err(EmbedError::Normalization(format!(
                "feature vector norm is {norm}"
            )));
        }

        tracing::debug!(path = %image_path.display(), dim = raw.len(), "embedding extracted");
        Ok(raw.into_iter().map(|v| v / norm).collect())
    }
}

/// Euclidean length of a vector.
fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}
